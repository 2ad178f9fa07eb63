//! Caredesk API Client
//!
//! This crate provides the shared state and network layer for the role
//! dashboards: an explicit session context, per-role capability sets, and
//! typed calls to the Caredesk API.

pub mod capabilities;
pub mod client;
pub mod error;
pub mod session;

pub use capabilities::{Capability, capabilities, role_can};
pub use client::{ApiClient, AppointmentChange, AppointmentRequest, RecordRequest, RegisterForm};
pub use error::ClientError;
pub use session::{Identity, Session};
