//! Board wiring, generated by build.rs from board.toml

include!(concat!(env!("OUT_DIR"), "/board.rs"));
