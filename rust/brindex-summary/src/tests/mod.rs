mod serialized_tests;
mod union_tests;
