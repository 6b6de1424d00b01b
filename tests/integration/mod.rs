//! HTTP backend integration tests.

mod http_backend_test;
