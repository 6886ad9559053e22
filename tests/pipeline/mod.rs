mod common;
mod dashboard;
mod end_to_end;
mod evaluator;
