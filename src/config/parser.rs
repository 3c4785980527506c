//! Grammar for `config.cat`.
//!
//! ```text
//! file         := config-block target-block*
//! config-block := "config" "{" config-field* "}"
//! target-block := "target" type-ident name-ident "{" target-field* "}"
//! config-field := key ":" value   (compiler, build_dir, default_flags, auto_discovery)
//! target-field := key ":" value   (sources, flags, output)
//! ```
//!
//! Lists are written `[a b c]` and may span lines. Parsing stops at the
//! first error; no partial model is ever returned.

use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Cursor, is_delim, is_separator, is_space};
use super::{MAX_FLAGS, MAX_SOURCES, MAX_TARGETS, ProjectConfig, Target, TargetKind};
use crate::arena::Arena;
use std::io;

/// Expands `sources` entries when auto-discovery is enabled.
pub trait SourceResolver {
    /// Returns the project-relative files `entry` stands for, or `None`
    /// to keep the entry as written.
    fn expand(&self, entry: &str) -> io::Result<Option<Vec<String>>>;
}

/// Per-invocation parser settings.
#[derive(Default)]
pub struct ParseContext<'r> {
    /// Directory levels climbed to find the file; copied into the model.
    pub depth: usize,
    /// Used only when the file sets `auto_discovery: true`.
    pub resolver: Option<&'r dyn SourceResolver>,
}

#[derive(Debug, Clone, Copy)]
enum ConfigKey {
    Compiler,
    BuildDir,
    DefaultFlags,
    AutoDiscovery,
}

impl ConfigKey {
    fn lookup(key: &str) -> Option<Self> {
        match key {
            "compiler" => Some(ConfigKey::Compiler),
            "build_dir" => Some(ConfigKey::BuildDir),
            "default_flags" => Some(ConfigKey::DefaultFlags),
            "auto_discovery" => Some(ConfigKey::AutoDiscovery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TargetKey {
    Sources,
    Flags,
    Output,
}

impl TargetKey {
    fn lookup(key: &str) -> Option<Self> {
        match key {
            "sources" => Some(TargetKey::Sources),
            "flags" => Some(TargetKey::Flags),
            "output" => Some(TargetKey::Output),
            _ => None,
        }
    }
}

struct Parser<'a, 'r> {
    arena: &'a Arena,
    cursor: Cursor<'a>,
    resolver: Option<&'r dyn SourceResolver>,
    auto_discovery: bool,
}

#[derive(Default)]
struct ConfigBlock<'a> {
    compiler: Option<&'a str>,
    build_dir: Option<&'a str>,
    default_flags: Vec<&'a str>,
}

/// Parses `src` into a project model whose strings borrow from `src` and
/// whose lists are copied into `arena`.
pub fn parse<'a>(
    arena: &'a Arena,
    src: &'a str,
    ctx: &ParseContext<'_>,
) -> Result<ProjectConfig<'a>, ParseError> {
    let mut parser = Parser {
        arena,
        cursor: Cursor::new(src),
        resolver: ctx.resolver,
        auto_discovery: false,
    };

    parser.cursor.skip_whitespace();
    let config = parser.config_block()?;

    let mut targets: Vec<Target<'a>> = Vec::new();
    loop {
        parser.cursor.skip_whitespace();
        if parser.cursor.is_eof() {
            break;
        }
        if targets.len() == MAX_TARGETS {
            return Err(parser.cursor.error(ParseErrorKind::LimitExceeded {
                what: "targets",
                limit: MAX_TARGETS,
            }));
        }
        let target = parser.target_block(&targets)?;
        targets.push(target);
    }

    if targets.is_empty() {
        return Err(parser.cursor.error(ParseErrorKind::NoTargets));
    }

    Ok(ProjectConfig {
        // Both were checked when the config block closed.
        compiler: config.compiler.unwrap_or_default(),
        build_dir: config.build_dir.unwrap_or_default(),
        default_flags: arena.alloc_slice_copy(&config.default_flags),
        auto_discovery: parser.auto_discovery,
        depth: ctx.depth,
        targets: arena.alloc_slice_copy(&targets),
    })
}

impl<'a> Parser<'a, '_> {
    fn config_block(&mut self) -> Result<ConfigBlock<'a>, ParseError> {
        self.cursor.expect_keyword("config")?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b'{')?;

        let mut block = ConfigBlock::default();

        while let Some((key, key_pos)) = self.next_key()? {
            match ConfigKey::lookup(key) {
                Some(ConfigKey::Compiler) => block.compiler = Some(self.scalar()?),
                Some(ConfigKey::BuildDir) => block.build_dir = Some(self.scalar()?),
                Some(ConfigKey::DefaultFlags) => {
                    self.list(&mut block.default_flags, "default flags", MAX_FLAGS)?
                }
                Some(ConfigKey::AutoDiscovery) => self.auto_discovery = self.boolean()?,
                None => {
                    return Err(self
                        .cursor
                        .error_at(key_pos, ParseErrorKind::UnknownKey(key.to_string())));
                }
            }
        }

        let close = self.cursor.pos() - 1;
        for (field, value) in [("compiler", block.compiler), ("build_dir", block.build_dir)] {
            if value.is_none() {
                return Err(self.cursor.error_at(
                    close,
                    ParseErrorKind::MissingField {
                        field,
                        block: "config block".to_string(),
                    },
                ));
            }
        }

        Ok(block)
    }

    fn target_block(&mut self, earlier: &[Target<'a>]) -> Result<Target<'a>, ParseError> {
        self.cursor.expect_keyword("target")?;
        self.cursor.skip_whitespace();

        let kind_pos = self.cursor.pos();
        let kind_word = self.cursor.ident();
        if kind_word.is_empty() {
            return Err(self.missing("a target type"));
        }
        let kind = TargetKind::from_ident(kind_word).ok_or_else(|| {
            self.cursor.error_at(
                kind_pos,
                ParseErrorKind::UnknownTargetKind(kind_word.to_string()),
            )
        })?;

        self.cursor.skip_whitespace();
        let name_pos = self.cursor.pos();
        let name = self.cursor.ident();
        if name.is_empty() {
            return Err(self.missing("a target name"));
        }
        if earlier.iter().any(|t| t.name == name) {
            return Err(self
                .cursor
                .error_at(name_pos, ParseErrorKind::DuplicateTarget(name.to_string())));
        }

        self.cursor.skip_whitespace();
        self.cursor.expect(b'{')?;

        let mut sources = Vec::new();
        let mut flags = Vec::new();
        let mut output = None;

        while let Some((key, key_pos)) = self.next_key()? {
            match TargetKey::lookup(key) {
                Some(TargetKey::Sources) => self.sources(&mut sources)?,
                Some(TargetKey::Flags) => self.list(&mut flags, "flags", MAX_FLAGS)?,
                Some(TargetKey::Output) => output = Some(self.output()?),
                None => {
                    return Err(self
                        .cursor
                        .error_at(key_pos, ParseErrorKind::UnknownKey(key.to_string())));
                }
            }
        }

        let Some((output_dir, output_name)) = output else {
            return Err(self.cursor.error_at(
                self.cursor.pos() - 1,
                ParseErrorKind::MissingField {
                    field: "output",
                    block: format!("target `{name}`"),
                },
            ));
        };

        Ok(Target {
            kind,
            name,
            sources: self.arena.alloc_slice_copy(&sources),
            flags: self.arena.alloc_slice_copy(&flags),
            output_dir,
            output_name,
        })
    }

    /// Reads `key :` inside a block. Returns `None` after consuming the
    /// closing `}`.
    fn next_key(&mut self) -> Result<Option<(&'a str, usize)>, ParseError> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            None => return Err(self.cursor.error(ParseErrorKind::UnexpectedEof)),
            Some(b'}') => {
                self.cursor.bump();
                return Ok(None);
            }
            Some(_) => {}
        }

        let pos = self.cursor.pos();
        let key = self.cursor.ident();
        if key.is_empty() {
            return Err(self.missing("a key or `}`"));
        }

        self.cursor.skip_whitespace();
        self.cursor.expect(b':')?;
        self.cursor.skip_whitespace();
        Ok(Some((key, pos)))
    }

    fn scalar(&mut self) -> Result<&'a str, ParseError> {
        let value = self.cursor.ident();
        if value.is_empty() {
            return Err(self.missing("a value"));
        }
        Ok(value)
    }

    fn boolean(&mut self) -> Result<bool, ParseError> {
        let pos = self.cursor.pos();
        match self.scalar()? {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self
                .cursor
                .error_at(pos, ParseErrorKind::InvalidBool(other.to_string()))),
        }
    }

    /// `<dir>/<name>`: the text after the last `/` is the file name, the
    /// text before it the directory. Both must be non-empty.
    fn output(&mut self) -> Result<(&'a str, &'a str), ParseError> {
        let pos = self.cursor.pos();
        let value = self.scalar()?;

        match value.rsplit_once('/') {
            Some((dir, name)) if !dir.is_empty() && !name.is_empty() => Ok((dir, name)),
            _ => Err(self
                .cursor
                .error_at(pos, ParseErrorKind::InvalidOutputPath(value.to_string()))),
        }
    }

    /// Walks a bracketed list, calling `push` with each entry and its
    /// offset. Any run of whitespace, newlines included, separates entries.
    fn each_entry(
        &mut self,
        mut push: impl FnMut(&mut Self, &'a str, usize) -> Result<(), ParseError>,
    ) -> Result<(), ParseError> {
        self.cursor.expect(b'[')?;
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => return Err(self.cursor.error(ParseErrorKind::UnexpectedEof)),
                Some(b']') => {
                    self.cursor.bump();
                    return Ok(());
                }
                Some(_) => {}
            }

            let pos = self.cursor.pos();
            let entry = self.cursor.ident();
            if entry.is_empty() {
                return Err(self.missing("a list entry or `]`"));
            }
            push(self, entry, pos)?;
        }
    }

    fn list(
        &mut self,
        out: &mut Vec<&'a str>,
        what: &'static str,
        limit: usize,
    ) -> Result<(), ParseError> {
        self.each_entry(|p, entry, pos| p.push_limited(out, entry, pos, what, limit))
    }

    fn sources(&mut self, out: &mut Vec<&'a str>) -> Result<(), ParseError> {
        self.each_entry(|p, entry, pos| {
            let expanded = match (p.auto_discovery, p.resolver) {
                (true, Some(resolver)) => resolver.expand(entry).map_err(|e| {
                    p.cursor.error_at(
                        pos,
                        ParseErrorKind::Discovery {
                            entry: entry.to_string(),
                            message: e.to_string(),
                        },
                    )
                })?,
                _ => None,
            };

            match expanded {
                None => p.push_limited(out, entry, pos, "sources", MAX_SOURCES),
                Some(files) => {
                    for file in files {
                        let file: &'a str = p.arena.alloc_str(&file);
                        p.push_limited(out, file, pos, "sources", MAX_SOURCES)?;
                    }
                    Ok(())
                }
            }
        })
    }

    fn push_limited(
        &self,
        out: &mut Vec<&'a str>,
        entry: &'a str,
        pos: usize,
        what: &'static str,
        limit: usize,
    ) -> Result<(), ParseError> {
        if out.len() == limit {
            return Err(self
                .cursor
                .error_at(pos, ParseErrorKind::LimitExceeded { what, limit }));
        }
        out.push(entry);
        Ok(())
    }

    /// Error for a token that should have started at the cursor.
    fn missing(&self, expected: &str) -> ParseError {
        match self.cursor.peek() {
            None => self.cursor.error(ParseErrorKind::UnexpectedEof),
            Some(b) if is_space(b) || is_separator(b) || is_delim(b) => {
                self.cursor.error(ParseErrorKind::Expected {
                    expected: expected.to_string(),
                    found: self.cursor.describe_next(),
                })
            }
            Some(_) => self.cursor.unexpected(),
        }
    }
}
