#![allow(dead_code)]


pub use setup_scanner::{
    CONTRACT, OTHER_CONTRACT, PARENT, USER, builder, entry, event, setup_scanner,
};
