//! # TrendSync
//!
//! A local-first synchronization engine for keyword trend dashboards.
//!
//! TrendSync keeps an in-memory local store (with JSON snapshots) and a
//! hosted PostgREST-style store reconciled for five collections:
//! keywords, pairwise analyses, crawl targets, categories, and menu
//! settings. When the remote is unreachable the engine degrades to a
//! fully functional local mode and can push the accumulated state back
//! on reconnect.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐      ┌─────────────────┐      ┌─────────────┐
//! │  CLI       │─────▶│ SyncCoordinator │◀────▶│ LocalStore   │
//! │ (tsync)    │      │  mode routing   │      │ RAM + snap  │
//! └───────────┘      └───┬─────────┬───┘      └─────────────┘
//!                        │         │
//!              ┌─────────▼──┐   ┌──▼────────────┐
//!              │ Connection  │   │ ChangeNotifier │
//!              │  Monitor    │   │  SSE refetch   │
//!              └─────────┬──┘   └──┬────────────┘
//!                        ▼         ▼
//!                   ┌──────────────────┐
//!                   │  SupabaseStore    │
//!                   │ PostgREST client │
//!                   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tsync probe                       # check remote reachability
//! tsync keywords add "Edge AI"      # write (remote-first when connected)
//! tsync crawl                       # run the simulated crawler
//! tsync analyses generate AI Cloud  # append a pairwise analysis
//! tsync sync                        # push local state, pull remote state
//! tsync status                      # collection counts and mode
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and export helpers |
//! | [`local_store`] | In-memory store with snapshot persistence |
//! | [`remote`] | Fail-soft remote store trait and change events |
//! | [`supabase`] | PostgREST remote store implementation |
//! | [`connection`] | On-demand reachability probing and provisioning |
//! | [`notify`] | Per-table change subscriptions |
//! | [`sync`] | Mode routing and reconciliation |
//! | [`generate`] | Pairwise analysis generation |
//! | [`crawl`] | Crawl producers |

pub mod config;
pub mod connection;
pub mod crawl;
pub mod generate;
pub mod local_store;
pub mod models;
pub mod notify;
pub mod remote;
pub mod supabase;
pub mod sync;
