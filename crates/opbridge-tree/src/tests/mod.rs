//! Crate-level tests exercising documents built on the example schema.

use std::sync::Arc;

use rstest::fixture;

use crate::fixtures::{example_schema, reboot_document, reset_document};
use crate::{Document, Schema};


#[fixture]
fn schema() -> Arc<Schema> {
    example_schema().expect("example schema")
}

#[fixture]
fn reboot(schema: Arc<Schema>) -> Document {
    reboot_document(&schema).expect("reboot request")
}

#[fixture]
fn reset(schema: Arc<Schema>) -> Document {
    reset_document(&schema, "alpha").expect("reset request")
}
