//! Shared test doubles and fixtures.


pub(crate) use fake::FakeApi;
