// Each integration binary links this module separately and uses a subset
// of the helpers.
#![allow(dead_code)]

pub mod testing;
