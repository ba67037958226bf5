mod body_tests;
mod cookie_tests;
mod custom_matcher_tests;
mod headers_tests;
mod observer_tests;
mod times_tests;
mod unmatched_tests;
