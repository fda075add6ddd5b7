mod response;

pub(crate) use response::exit_code_for_error;
pub use response::{map_cmd_result_to_json, print_json_result, print_result};
