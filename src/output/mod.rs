pub mod response;

use serde::Serialize;

use crate::commands::{CmdResult, GlobalArgs, TextOutput};

pub use response::{map_cmd_result_to_json, print_json_result, print_text_result};

/// Print a command result in the selected mode and return its exit code.
pub(crate) fn respond<T: Serialize + TextOutput>(result: CmdResult<T>, global: &GlobalArgs) -> i32 {
    if global.json {
        let (json_result, exit_code) = map_cmd_result_to_json(result);
        if let Err(e) = print_json_result(json_result) {
            eprintln!("{}", e);
            return 1;
        }
        return exit_code;
    }

    let (text_result, exit_code) = match result {
        Ok((data, exit_code)) => (Ok(data.render()), exit_code),
        Err(err) => {
            let exit_code = response::exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    };

    if let Err(e) = print_text_result(text_result) {
        eprintln!("{}", e);
        return 1;
    }
    exit_code
}
