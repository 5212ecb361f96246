//! Work Queue Module
//!
//! A blocking FIFO used by the socket server to hand accepted connections to
//! its worker pool. Any number of producers may push and any number of
//! consumers may wait in `pop`; each pushed item is delivered to exactly one
//! consumer.

pub mod work_queue;

pub use work_queue::WorkQueue;
