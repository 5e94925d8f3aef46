//! # nodetext
//!
//! A parser and dynamic-node compiler for brace-delimited plain-text notes.
//!
//! File Layout
//!
//! The library is organized leaf-first, following the data flow of one parse cycle:
//! src/nodetext
//!   ├── syntax      Token literals and matchers
//!   ├── lexing      Text -> ordered symbol map
//!   ├── parsing     Symbol map -> node tree (with healing)
//!   ├── node        The parsed unit
//!   ├── metadata    Per-node key/value entries
//!   ├── dynamic     Dynamic definitions and their compiler
//!   ├── project     The project index that owns buffers and nodes
//!   └── formats     Buffer serializers (treeviz, json, yaml)
//!
//! A cycle is: raw text -> lexer -> parser -> nodes + metadata -> compiler -> rewritten
//! text, which is fed back into the lexer.

#![allow(rustdoc::invalid_html_tags)]

pub mod nodetext;
