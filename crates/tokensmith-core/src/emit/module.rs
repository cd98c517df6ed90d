//! Generated TypeScript entry module.

use super::json::json_outputs;
use super::{Artifact, EmitInput, Emitter, LINE_HEADER};
use crate::error::TokenResult;
use crate::naming::identifier;
use std::collections::HashSet;
use std::path::Path;
use tokensmith_common_config::ParserConfig;
use tokensmith_common_fs::path::import_specifier;

/// Writes `entryFilePath`, importing every JSON artifact and re-exporting
/// each as a named export and all of them as one merged default object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleEmitter;

impl Emitter for ModuleEmitter {
    fn name(&self) -> &'static str {
        "module"
    }

    fn enabled(&self, config: &ParserConfig) -> bool {
        config.entry_file_path.is_some()
    }

    fn emit(&self, input: &EmitInput<'_>) -> TokenResult<Vec<Artifact>> {
        let Some(entry) = input.config.entry_file_path.as_deref() else {
            return Ok(Vec::new());
        };
        let entry_dir = entry.parent().unwrap_or(Path::new(""));

        let mut seen = HashSet::new();
        let mut imports = Vec::new();
        for out in json_outputs(input)? {
            let base = if out.group.is_empty() {
                "tokens".to_string()
            } else {
                identifier(&out.group)
            };
            let mut ident = base.clone();
            let mut n = 2;
            while !seen.insert(ident.clone()) {
                ident = format!("{base}{n}");
                n += 1;
            }
            imports.push((ident, import_specifier(entry_dir, &out.path)));
        }

        let mut text = String::new();
        text.push_str(LINE_HEADER);
        text.push('\n');
        for (ident, specifier) in &imports {
            text.push_str(&format!("import {ident} from \"{specifier}\";\n"));
        }
        text.push('\n');

        let names: Vec<&str> = imports.iter().map(|(ident, _)| ident.as_str()).collect();
        text.push_str(&format!("export {{ {} }};\n\n", names.join(", ")));

        text.push_str("export default {\n");
        for name in &names {
            text.push_str(&format!("  ...{name},\n"));
        }
        text.push_str("};\n");

        Ok(vec![Artifact::new(entry, text)])
    }
}
