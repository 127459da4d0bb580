//! Network module tests
//!
//! Tests for the proxy monitor components: state machine, probe,
//! system proxy store, notifications, rendering and debug logging
