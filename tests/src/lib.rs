//! End-to-end scenarios for the fleet manager, driven by replayed discovery traffic and
//! mock devices.

#[cfg(test)]
mod discovery;
#[cfg(test)]
mod support;
