use crate::infrastructure::processors::classifier::is_typed_script;
use crate::utils::{DuplexError, Result};
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::path::Path;

/// Parses scripts into an oxc AST and prints them back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcTransformer;

impl OxcTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Parse `code` read from `path`. Any syntax error fails the whole file.
    pub fn parse<'a>(
        &self,
        allocator: &'a Allocator,
        code: &'a str,
        path: &Path,
    ) -> Result<Program<'a>> {
        let source_type = Self::source_type(path);
        let ret = Parser::new(allocator, code, source_type).parse();

        if ret.panicked || !ret.errors.is_empty() {
            let message = ret
                .errors
                .iter()
                .take(3)
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            let message = if message.is_empty() {
                "parser aborted".to_string()
            } else {
                message
            };
            return Err(DuplexError::parse(path, message));
        }

        Ok(ret.program)
    }

    pub fn generate(&self, program: &Program<'_>) -> String {
        Codegen::new().build(program).code
    }

    // Component sources use JSX in plain .js files
    fn source_type(path: &Path) -> SourceType {
        let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());
        if is_typed_script(path) {
            source_type
        } else {
            source_type.with_jsx(true)
        }
    }
}
