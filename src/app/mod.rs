//! Application layer — the watermark component, its notifications, the
//! tamper guard, and the interactive preview built on top of them.

pub mod event;
pub mod guard;
pub mod input;
pub mod preview;
pub mod watermark;
