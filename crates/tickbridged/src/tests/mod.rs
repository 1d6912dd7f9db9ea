//! Test suites for the bridge bootstrap, acceptor and command surface.

mod command_behaviour;
mod support;
mod unit;
