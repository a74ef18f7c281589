//! The `telnet` connection variant (`spec.md` §4.B/§4.C): not a
//! transport of its own but a protocol layer wrapping an inner
//! `Connection`. The wrapping and byte-shuffling live on `Connection`
//! itself (`mod.rs`) since the negotiation engine needs to reach back
//! into the *other* variants through the same `Stream` contract; this
//! module just names the pairing so call sites can refer to
//! `TelnetConnection` without reaching into `mod.rs`'s match arms.

pub type TelnetConnection = (Box<super::Connection>, telnet_negotiation::TelnetEngine);
