//! Groups
//!
//! Each group owns one group chat. Membership changes are mirrored into the
//! chat's participant list so members can always talk in it.

pub mod db;

pub mod handlers;
