use std::sync::Arc;

/// One parsed script statement: an identifier followed by parameters, where
/// a parameter is either a value or a nested block. File and line survive
/// into every error message downstream.
#[derive(Clone, Debug)]
pub struct Statement {
    pub file: Arc<str>,
    pub line: u32,
    pub id: String,
    pub params: Vec<Param>,
}

#[derive(Clone, Debug)]
pub enum Param {
    Value(String),
    Block(Vec<Statement>),
}

impl Param {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Param::Value(v) => Some(v),
            Param::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&[Statement]> {
        match self {
            Param::Value(_) => None,
            Param::Block(b) => Some(b),
        }
    }
}

impl Statement {
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

struct Reader {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    file: Arc<str>,
}

impl Reader {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if let Some(c) = c {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
            }
        }
        c
    }

    fn error(&self, message: &str) -> String {
        format!("{}:{}: {}", self.file, self.line, message)
    }

    /// Skips spaces, tabs and comments; stops at newlines (they terminate
    /// statements).
    fn skip_inline(&mut self) -> Result<(), String> {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.bump();
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => return Err(self.error("unterminated comment")),
                            Some('*') if self.chars.get(self.pos + 1) == Some(&'/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            _ => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_blank(&mut self) -> Result<(), String> {
        loop {
            self.skip_inline()?;
            match self.peek() {
                Some('\n') | Some(';') => {
                    self.bump();
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_quoted(&mut self) -> Result<String, String> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || c == '{' || c == '}' || c == ';' || c == '"' {
                break;
            }
            if c == '/'
                && matches!(self.chars.get(self.pos + 1), Some('/') | Some('*'))
            {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn read_statements(&mut self, nested: bool) -> Result<Vec<Statement>, String> {
        let mut statements = Vec::new();
        loop {
            self.skip_blank()?;
            match self.peek() {
                None => {
                    if nested {
                        return Err(self.error("missing '}'"));
                    }
                    return Ok(statements);
                }
                Some('}') => {
                    if !nested {
                        return Err(self.error("unexpected '}'"));
                    }
                    self.bump();
                    return Ok(statements);
                }
                _ => {}
            }
            statements.push(self.read_statement()?);
        }
    }

    fn read_statement(&mut self) -> Result<Statement, String> {
        let line = self.line;
        let id = match self.peek() {
            Some('"') => self.read_quoted()?,
            _ => self.read_word(),
        };
        if id.is_empty() {
            return Err(self.error("expected a statement"));
        }
        let mut params = Vec::new();
        loop {
            self.skip_inline()?;
            match self.peek() {
                None | Some('\n') | Some(';') => {
                    self.bump();
                    // the block brace may sit on the following line
                    let (saved_pos, saved_line) = (self.pos, self.line);
                    self.skip_blank()?;
                    if self.peek() == Some('{') {
                        continue;
                    }
                    self.pos = saved_pos;
                    self.line = saved_line;
                    break;
                }
                Some('}') => break,
                Some('{') => {
                    self.bump();
                    let block = self.read_statements(true)?;
                    params.push(Param::Block(block));
                    break;
                }
                Some('"') => params.push(Param::Value(self.read_quoted()?)),
                _ => {
                    let word = self.read_word();
                    if word.is_empty() {
                        return Err(self.error("malformed statement"));
                    }
                    params.push(Param::Value(word));
                }
            }
        }
        Ok(Statement {
            file: self.file.clone(),
            line,
            id,
            params,
        })
    }
}

/// Parses one script file into its top-level statements.
pub fn parse(source: &str, file: &str) -> Result<Vec<Statement>, String> {
    let mut reader = Reader {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        file: Arc::from(file),
    };
    reader.read_statements(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_with_states() {
        let source = r#"
// an object
object "Test Object"
{
    requires 0.2.0
    category enemy "boss fight"

    state "main"
    {
        set_alpha 0.5
        if "$i < 5" "other"
    }
}
"#;
        let statements = parse(source, "test.obj").unwrap();
        assert_eq!(statements.len(), 1);
        let object = &statements[0];
        assert_eq!(object.id, "object");
        assert_eq!(object.params[0].as_value(), Some("Test Object"));
        let body = object.params[1].as_block().unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(body[1].id, "category");
        assert_eq!(body[1].params[1].as_value(), Some("boss fight"));
        let state = &body[2];
        assert_eq!(state.id, "state");
        let commands = state.params[1].as_block().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].id, "if");
        assert_eq!(commands[1].params.len(), 2);
    }

    #[test]
    fn tracks_line_numbers() {
        let source = "object \"a\"\n{\n    state \"main\"\n    {\n    }\n}\n";
        let statements = parse(source, "a.obj").unwrap();
        assert_eq!(statements[0].line, 1);
        let body = statements[0].params[1].as_block().unwrap();
        assert_eq!(body[0].line, 3);
        assert_eq!(body[0].location(), "a.obj:3");
    }

    #[test]
    fn comments_are_ignored() {
        let source = "object \"a\" /* inline */ {\n// nothing\n}\n";
        let statements = parse(source, "a.obj").unwrap();
        assert!(statements[0].params[1].as_block().unwrap().is_empty());
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert!(parse("object \"a\" {", "a.obj").is_err());
        assert!(parse("}", "a.obj").is_err());
        assert!(parse("object \"a\" { /* ", "a.obj").is_err());
    }

    #[test]
    fn semicolons_separate_statements() {
        let source = "object \"a\" { state \"main\" { show; hide } }";
        let statements = parse(source, "a.obj").unwrap();
        let body = statements[0].params[1].as_block().unwrap();
        let commands = body[0].params[1].as_block().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].id, "show");
        assert_eq!(commands[1].id, "hide");
    }
}
