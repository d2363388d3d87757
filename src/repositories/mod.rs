//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the
//! board's tables. Each holds a shared pool handle injected at construction.

pub mod apply_token;
pub mod edit_token;
pub mod job;
pub mod job_event;
pub mod purchase_event;

pub use apply_token::ApplyTokenRepository;
pub use edit_token::EditTokenRepository;
pub use job::JobRepository;
pub use job_event::{DailyEngagement, JobEventRepository};
pub use purchase_event::{NewPurchaseEvent, PurchaseEventRepository};
