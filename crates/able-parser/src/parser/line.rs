//! Line-oriented parser for Able sources
//!
//! Recognizes the statements the loader cares about and keeps everything
//! else as opaque text. Blocks open with a line ending in `{` and close with
//! a line starting with `}`.

use super::import::parse_import_clause;
use super::{is_identifier, strip_comment, strip_keyword, ParseError, SourceParser};
use crate::ast::{
    Block, FileId, NodeIds, OpaqueStatement, PackageStatement, SourceModule, Statement,
};

/// Built-in [`SourceParser`]
#[derive(Debug, Default, Clone, Copy)]
pub struct LineParser;

impl LineParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for LineParser {
    fn parse(&self, file: FileId, source: &str) -> Result<SourceModule, ParseError> {
        let mut state = ParseState::new(file);
        for (index, raw) in source.lines().enumerate() {
            state.parse_line(index + 1, raw)?;
        }
        state.finish()
    }
}

struct OpenBlock {
    block: Block,
    column: usize,
}

struct ParseState {
    ids: NodeIds,
    module: SourceModule,
    open: Vec<OpenBlock>,
    last_line: usize,
}

impl ParseState {
    fn new(file: FileId) -> Self {
        let mut ids = NodeIds::new(file);
        let module = SourceModule {
            id: ids.next_id(),
            package: None,
            imports: Vec::new(),
            body: Vec::new(),
        };
        Self {
            ids,
            module,
            open: Vec::new(),
            last_line: 0,
        }
    }

    fn parse_line(&mut self, line: usize, raw: &str) -> Result<(), ParseError> {
        self.last_line = line;
        let code = strip_comment(raw);
        let mut column = leading_columns(code) + 1;
        let mut text = code.trim();

        while let Some(rest) = text.strip_prefix('}') {
            self.close_block(line, column)?;
            let trimmed = rest.trim_start();
            column += 1 + (rest.chars().count() - trimmed.chars().count());
            text = trimmed.trim_end();
        }
        if text.is_empty() {
            return Ok(());
        }

        if let Some(rest) = strip_keyword(text, "private") {
            if let Some(decl) = strip_keyword(rest.trim_start(), "package") {
                return self.parse_package(line, column, decl, true);
            }
        }
        if let Some(decl) = strip_keyword(text, "package") {
            return self.parse_package(line, column, decl, false);
        }
        if let Some(clause) = strip_keyword(text, "import") {
            if !self.open.is_empty() {
                return Err(ParseError::at(
                    "`import` is only allowed at the top level",
                    line,
                    column,
                    "import".len(),
                ));
            }
            let clause_column = column + "import".len();
            let import = parse_import_clause(&mut self.ids, "import", clause, line, clause_column)?;
            self.module.imports.push(import);
            return Ok(());
        }
        if let Some(clause) = strip_keyword(text, "dynimport") {
            let clause_column = column + "dynimport".len();
            let import =
                parse_import_clause(&mut self.ids, "dynimport", clause, line, clause_column)?;
            self.push(Statement::DynImport(import));
            return Ok(());
        }

        if let Some(header) = text.strip_suffix('{') {
            let block = Block {
                id: self.ids.next_id(),
                header: header.trim_end().to_string(),
                body: Vec::new(),
                line,
            };
            self.open.push(OpenBlock { block, column });
            return Ok(());
        }

        let stmt = OpaqueStatement {
            id: self.ids.next_id(),
            text: text.to_string(),
            line,
        };
        self.push(Statement::Opaque(stmt));
        Ok(())
    }

    fn parse_package(
        &mut self,
        line: usize,
        column: usize,
        decl: &str,
        is_private: bool,
    ) -> Result<(), ParseError> {
        let started = self.module.package.is_some()
            || !self.module.imports.is_empty()
            || !self.module.body.is_empty()
            || !self.open.is_empty();
        if started {
            return Err(ParseError::at(
                "package declaration must be the first statement",
                line,
                column,
                "package".len(),
            ));
        }

        let name = decl.trim();
        let name = name.strip_suffix(';').unwrap_or(name).trim();
        if name.is_empty() {
            return Err(ParseError::at("expected package name", line, column, "package".len()));
        }
        let segments: Vec<&str> = name.split('.').map(str::trim).collect();
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(ParseError::at(
                format!("invalid package name segment `{}`", bad),
                line,
                column,
                "package".len(),
            ));
        }

        self.module.package = Some(PackageStatement::from_segments(
            &mut self.ids,
            &segments,
            is_private,
        ));
        Ok(())
    }

    fn push(&mut self, stmt: Statement) {
        match self.open.last_mut() {
            Some(open) => open.block.body.push(stmt),
            None => self.module.body.push(stmt),
        }
    }

    fn close_block(&mut self, line: usize, column: usize) -> Result<(), ParseError> {
        let open = self
            .open
            .pop()
            .ok_or_else(|| ParseError::at("unmatched `}`", line, column, 1))?;
        self.push(Statement::Block(open.block));
        Ok(())
    }

    fn finish(mut self) -> Result<SourceModule, ParseError> {
        if let Some(open) = self.open.pop() {
            return Err(ParseError {
                message: "unclosed block".to_string(),
                line: open.block.line,
                column: open.column,
                end_line: self.last_line.max(open.block.line),
                end_column: open.column + 1,
            });
        }
        Ok(self.module)
    }
}

fn leading_columns(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}
