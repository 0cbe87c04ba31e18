mod send_quota;

pub use send_quota::{SendQuotaChanges, SendQuotaRow};
