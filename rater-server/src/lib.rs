//! # Rater Server
//!
//! A standalone admission-control service speaking a line-based TCP
//! protocol.
//!
//! ## Wire Protocol
//!
//! One request per connection. The client sends:
//!
//! ```text
//! <class> <value>\n
//! ```
//!
//! and receives exactly one line back before the connection is closed:
//!
//! ```text
//! <code> <detail>\r\n
//! ```
//!
//! Codes: `0` = allowed (`0 3/10` means three marks against a limit of
//! ten), `1` = rate exceeded, `2` = error (bad input, unknown class, no
//! matching key). Lines over 1000 bytes are answered with
//! `1 Line is too long`.
//!
//! ## Quick Start
//!
//! ```bash
//! # Limits file
//! cat > limits.yaml <<'EOF'
//! limits:
//!   ip:
//!     - pattern: "10.0.0.*"
//!       window: 90
//!       limit: 10
//! EOF
//!
//! rater --limits limits.yaml --port 1999
//!
//! # Ask whether 10.0.0.4 is over its rate
//! printf 'ip 10.0.0.4\n' | nc 127.0.0.1 1999
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐      ┌───────────┐
//! │     Line     │      │  Expiry   │
//! │  Transport   │      │ Scheduler │
//! └──────┬───────┘      └─────┬─────┘
//!        │   decide           │  purge
//!        └─────────┬──────────┘
//!                  │
//!            ┌─────▼─────┐
//!            │   Actor   │
//!            └─────┬─────┘
//!                  │
//!            ┌─────▼─────┐
//!            │ Decision  │
//!            │  Engine   │
//!            │ + Marks   │
//!            └───────────┘
//! ```
//!
//! A single actor task owns the decision engine and its mark store, so all
//! counting is serialized; transports and the expiry scheduler are clients
//! of that actor. Configuration is immutable after startup, and the mark
//! collection is volatile by design: a restart clears all counts.

pub mod actor;
pub mod config;
pub mod expiry;
pub mod transport;
