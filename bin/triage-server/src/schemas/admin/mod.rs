//! Wire types for the admin dashboard.  These expose full rows, credentials
//! included; every route under `/api/admin` sits behind the admin gate.

pub mod groups;
pub mod models;
pub mod rag;
pub mod users;
