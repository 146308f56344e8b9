//! Registry behaviour tests.
