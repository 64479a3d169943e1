use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::actor::Actor;
use crate::objects::symbols::{read_var, write_var, ArrayStore, SymbolTable};
use crate::player::Player;

/// Everything an expression can observe or mutate while evaluating: the
/// routed symbol tables, the array store, the level RNG, and a read-only
/// view of the object the expression is bound to.
pub struct EvalEnv<'a> {
    pub locals: &'a mut SymbolTable,
    pub globals: &'a mut SymbolTable,
    pub arrays: &'a mut ArrayStore,
    pub rng: &'a mut SmallRng,
    pub host: Host<'a>,
}

/// Read-only slice of the world the domain builtins resolve against.
pub struct Host<'a> {
    pub actor: &'a Actor,
    pub player: &'a Player,
    pub dt: f32,
    pub time: f32,
    pub zindex: f32,
    pub score: i32,
    pub lives: i32,
    pub collectibles: i32,
    pub screen: Vec2,
    pub team_size: usize,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A parsed arithmetic/logic expression. Parsing happens once at compile
/// time; evaluation is a cheap tree walk per frame.
#[derive(Clone, Debug)]
pub enum Expr {
    Number(f32),
    Var(String),
    Assign(String, Box<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinOpExpr),
    Call(String, Vec<Expr>),
}

#[derive(Clone, Debug)]
pub struct BinOpExpr {
    op: BinOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f32),
    Var(String),
    Ident(String),
    Op(String),
    LParen,
    RParen,
    Comma,
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit()) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f32>()
                .map_err(|_| format!("bad number '{text}' in expression"))?;
            tokens.push(Token::Number(value));
        } else if c == '$' {
            i += 1;
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            if start == i {
                return Err("'$' must be followed by a variable name".to_string());
            }
            tokens.push(Token::Var(chars[start..i].iter().collect()));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if word == "mod" {
                tokens.push(Token::Op("%".to_string()));
            } else {
                tokens.push(Token::Ident(word));
            }
        } else {
            let two: String = chars[i..chars.len().min(i + 2)].iter().collect();
            match two.as_str() {
                "==" | "!=" | "<=" | ">=" | "&&" | "||" => {
                    tokens.push(Token::Op(two));
                    i += 2;
                    continue;
                }
                _ => {}
            }
            match c {
                '(' => tokens.push(Token::LParen),
                ')' => tokens.push(Token::RParen),
                ',' => tokens.push(Token::Comma),
                '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' => {
                    tokens.push(Token::Op(c.to_string()))
                }
                _ => return Err(format!("unexpected character '{c}' in expression")),
            }
            i += 1;
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Token::Op(o)) if o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn assignment(&mut self) -> Result<Expr, String> {
        if let Some(Token::Var(name)) = self.peek().cloned() {
            if matches!(self.tokens.get(self.pos + 1), Some(Token::Op(o)) if o == "=") {
                self.pos += 2;
                let value = self.assignment()?;
                return Ok(Expr::Assign(name, Box::new(value)));
            }
        }
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and_expr()?;
        while self.eat_op("||") {
            let rhs = self.and_expr()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.comparison()?;
        while self.eat_op("&&") {
            let rhs = self.comparison()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(o)) => match o.as_str() {
                    "==" => BinOp::Eq,
                    "!=" => BinOp::Ne,
                    "<" => BinOp::Lt,
                    "<=" => BinOp::Le,
                    ">" => BinOp::Gt,
                    ">=" => BinOp::Ge,
                    _ => break,
                },
                _ => break,
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.multiplicative()?;
        loop {
            if self.eat_op("+") {
                let rhs = self.multiplicative()?;
                lhs = binary(BinOp::Add, lhs, rhs);
            } else if self.eat_op("-") {
                let rhs = self.multiplicative()?;
                lhs = binary(BinOp::Sub, lhs, rhs);
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            if self.eat_op("*") {
                let rhs = self.unary()?;
                lhs = binary(BinOp::Mul, lhs, rhs);
            } else if self.eat_op("/") {
                let rhs = self.unary()?;
                lhs = binary(BinOp::Div, lhs, rhs);
            } else if self.eat_op("%") {
                let rhs = self.unary()?;
                lhs = binary(BinOp::Mod, lhs, rhs);
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat_op("-") {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat_op("!") {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Var(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let inner = self.assignment()?;
                if self.next() != Some(Token::RParen) {
                    return Err("missing ')' in expression".to_string());
                }
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                let mut args = Vec::new();
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.assignment()?);
                            match self.next() {
                                Some(Token::Comma) => continue,
                                Some(Token::RParen) => break,
                                _ => return Err(format!("bad argument list for '{name}'")),
                            }
                        }
                    } else {
                        self.pos += 1;
                    }
                }
                let arity = builtin_arity(&name)
                    .ok_or_else(|| format!("unknown function '{name}' in expression"))?;
                if args.len() != arity {
                    return Err(format!(
                        "function '{name}' expects {arity} argument(s), got {}",
                        args.len()
                    ));
                }
                Ok(Expr::Call(name, args))
            }
            other => Err(format!("unexpected token {other:?} in expression")),
        }
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(BinOpExpr {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn builtin_arity(name: &str) -> Option<usize> {
    Some(match name {
        "cond" | "clamp" | "lerp" | "set_array_element" => 3,
        "min" | "max" | "atan2" | "array_element" | "resize_array" => 2,
        "sign" | "abs" | "random" | "floor" | "ceil" | "round" | "sqrt" | "exp" | "log"
        | "log10" | "sin" | "cos" | "tan" | "asin" | "acos" | "atan" | "sinh" | "cosh"
        | "tanh" | "deg2rad" | "rad2deg" | "new_array" | "delete_array" | "array_length"
        | "clone_array" | "is_array" => 1,
        "pi" | "infinity" | "elapsed_time" | "dt" | "fps" | "xpos" | "ypos" | "spawnpoint_x"
        | "spawnpoint_y" | "hotspot_x" | "hotspot_y" | "alpha" | "angle" | "scale_x"
        | "scale_y" | "direction" | "animation_frame" | "animation_id"
        | "animation_speed_factor" | "animation_frame_count" | "zindex" | "width" | "height"
        | "screen_width" | "screen_height" | "score" | "lives" | "collectibles"
        | "player_xpos" | "player_ypos" | "player_xspeed" | "player_yspeed" | "player_angle"
        | "player_direction" | "number_of_active_players" => 0,
        _ => return None,
    })
}

impl Expr {
    /// Parses the expression once; commands keep the tree and re-evaluate it
    /// each frame.
    pub fn parse(source: &str) -> Result<Expr, String> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err("empty expression".to_string());
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.assignment()?;
        if parser.pos != parser.tokens.len() {
            return Err(format!("trailing input in expression '{source}'"));
        }
        Ok(expr)
    }

    pub fn constant(value: f32) -> Expr {
        Expr::Number(value)
    }

    pub fn evaluate(&self, env: &mut EvalEnv) -> f32 {
        match self {
            Expr::Number(value) => *value,
            Expr::Var(name) => read_var(name, env.locals, env.globals),
            Expr::Assign(name, value) => {
                let value = value.evaluate(env);
                write_var(name, value, env.locals, env.globals);
                value
            }
            Expr::Neg(inner) => -inner.evaluate(env),
            Expr::Not(inner) => bool_value(!is_true(inner.evaluate(env))),
            Expr::Binary(bin) => {
                let a = bin.lhs.evaluate(env);
                match bin.op {
                    BinOp::Or => {
                        if is_true(a) {
                            return 1.0;
                        }
                        bool_value(is_true(bin.rhs.evaluate(env)))
                    }
                    BinOp::And => {
                        if !is_true(a) {
                            return 0.0;
                        }
                        bool_value(is_true(bin.rhs.evaluate(env)))
                    }
                    op => {
                        let b = bin.rhs.evaluate(env);
                        match op {
                            BinOp::Eq => bool_value(a == b),
                            BinOp::Ne => bool_value(a != b),
                            BinOp::Lt => bool_value(a < b),
                            BinOp::Le => bool_value(a <= b),
                            BinOp::Gt => bool_value(a > b),
                            BinOp::Ge => bool_value(a >= b),
                            BinOp::Add => a + b,
                            BinOp::Sub => a - b,
                            BinOp::Mul => a * b,
                            BinOp::Div => a / b,
                            BinOp::Mod => a % b,
                            BinOp::Or | BinOp::And => unreachable!(),
                        }
                    }
                }
            }
            Expr::Call(name, args) => {
                let mut values = [0.0f32; 3];
                for (slot, arg) in values.iter_mut().zip(args.iter()) {
                    *slot = arg.evaluate(env);
                }
                call_builtin(name, &values[..args.len()], env)
            }
        }
    }
}

fn is_true(value: f32) -> bool {
    value.abs() >= 1e-5
}

fn bool_value(flag: bool) -> f32 {
    if flag {
        1.0
    } else {
        0.0
    }
}

fn call_builtin(name: &str, args: &[f32], env: &mut EvalEnv) -> f32 {
    let host = &env.host;
    match name {
        "cond" => {
            if is_true(args[0]) {
                args[1]
            } else {
                args[2]
            }
        }
        "clamp" => args[0].clamp(args[1].min(args[2]), args[1].max(args[2])),
        "lerp" => args[0] + (args[1] - args[0]) * args[2],
        "min" => args[0].min(args[1]),
        "max" => args[0].max(args[1]),
        "atan2" => args[0].atan2(args[1]),
        "sign" => {
            if args[0] >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        "abs" => args[0].abs(),
        "random" => env.rng.gen::<f32>() * args[0],
        "floor" => args[0].floor(),
        "ceil" => args[0].ceil(),
        "round" => args[0].round(),
        "sqrt" => args[0].sqrt(),
        "exp" => args[0].exp(),
        "log" => args[0].ln(),
        "log10" => args[0].log10(),
        "sin" => args[0].sin(),
        "cos" => args[0].cos(),
        "tan" => args[0].tan(),
        "asin" => args[0].asin(),
        "acos" => args[0].acos(),
        "atan" => args[0].atan(),
        "sinh" => args[0].sinh(),
        "cosh" => args[0].cosh(),
        "tanh" => args[0].tanh(),
        "deg2rad" => args[0].to_radians(),
        "rad2deg" => args[0].to_degrees(),
        "pi" => std::f32::consts::PI,
        "infinity" => f32::INFINITY,
        "new_array" => env.arrays.new_array(args[0].max(0.0) as usize),
        "delete_array" => {
            env.arrays.delete(args[0]);
            0.0
        }
        "resize_array" => {
            env.arrays.resize(args[0], args[1].max(0.0) as usize);
            0.0
        }
        "array_length" => env.arrays.len(args[0]),
        "array_element" => env.arrays.get(args[0], args[1]),
        "set_array_element" => {
            env.arrays.set(args[0], args[1], args[2]);
            args[2]
        }
        "clone_array" => env.arrays.clone_array(args[0]),
        "is_array" => bool_value(env.arrays.is_array(args[0])),
        "elapsed_time" => host.time,
        "dt" => host.dt,
        "fps" => {
            if host.dt > 0.0 {
                1.0 / host.dt
            } else {
                0.0
            }
        }
        "xpos" => host.actor.position.x,
        "ypos" => host.actor.position.y,
        "spawnpoint_x" => host.actor.spawn_point.x,
        "spawnpoint_y" => host.actor.spawn_point.y,
        "hotspot_x" => host.actor.hot_spot().x,
        "hotspot_y" => host.actor.hot_spot().y,
        "alpha" => host.actor.alpha,
        "angle" => host.actor.angle.to_degrees(),
        "scale_x" => host.actor.scale.x,
        "scale_y" => host.actor.scale.y,
        "direction" => host.actor.direction(),
        "animation_frame" => host.actor.anim.frame() as f32,
        "animation_id" => host.actor.anim.anim_id as f32,
        "animation_speed_factor" => host.actor.anim.speed_factor,
        "animation_frame_count" => host.actor.anim.frame_count as f32,
        "zindex" => host.zindex,
        "width" => host.actor.size().x,
        "height" => host.actor.size().y,
        "screen_width" => host.screen.x,
        "screen_height" => host.screen.y,
        "score" => host.score as f32,
        "lives" => host.lives as f32,
        "collectibles" => host.collectibles as f32,
        "player_xpos" => host.player.actor.position.x,
        "player_ypos" => host.player.actor.position.y,
        "player_xspeed" => host.player.actor.speed.x,
        "player_yspeed" => host.player.actor.speed.y,
        "player_angle" => host.player.actor.angle.to_degrees(),
        "player_direction" => host.player.actor.direction(),
        "number_of_active_players" => host.team_size as f32,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn eval(source: &str, locals: &mut SymbolTable) -> f32 {
        let expr = Expr::parse(source).unwrap();
        let mut globals = SymbolTable::default();
        let mut arrays = ArrayStore::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let actor = Actor::default();
        let player = Player::new("Surge");
        let mut env = EvalEnv {
            locals,
            globals: &mut globals,
            arrays: &mut arrays,
            rng: &mut rng,
            host: Host {
                actor: &actor,
                player: &player,
                dt: 1.0 / 60.0,
                time: 2.0,
                zindex: 0.5,
                score: 100,
                lives: 3,
                collectibles: 7,
                screen: Vec2::new(426.0, 240.0),
                team_size: 1,
            },
        };
        expr.evaluate(&mut env)
    }

    #[test]
    fn precedence_and_arithmetic() {
        let mut locals = SymbolTable::default();
        assert_eq!(eval("1 + 2 * 3", &mut locals), 7.0);
        assert_eq!(eval("(1 + 2) * 3", &mut locals), 9.0);
        assert_eq!(eval("10 mod 4", &mut locals), 2.0);
        assert_eq!(eval("-3 + 5", &mut locals), 2.0);
    }

    #[test]
    fn comparisons_yield_booleans() {
        let mut locals = SymbolTable::default();
        assert_eq!(eval("2 < 3", &mut locals), 1.0);
        assert_eq!(eval("2 >= 3", &mut locals), 0.0);
        assert_eq!(eval("1 && 0", &mut locals), 0.0);
        assert_eq!(eval("1 || 0", &mut locals), 1.0);
        assert_eq!(eval("!0", &mut locals), 1.0);
    }

    #[test]
    fn assignment_writes_and_returns() {
        let mut locals = SymbolTable::default();
        assert_eq!(eval("$i = 4 + 1", &mut locals), 5.0);
        assert_eq!(locals.get("i"), 5.0);
        assert_eq!(eval("$i = $i + 1", &mut locals), 6.0);
    }

    #[test]
    fn functions_check_arity() {
        assert!(Expr::parse("min(1)").is_err());
        assert!(Expr::parse("nosuchfn(1)").is_err());
        assert!(Expr::parse("min(1, 2)").is_ok());
        let mut locals = SymbolTable::default();
        assert_eq!(eval("clamp(5, 0, 2)", &mut locals), 2.0);
        assert_eq!(eval("cond(2 > 1, 10, 20)", &mut locals), 10.0);
    }

    #[test]
    fn host_builtins_read_the_binding() {
        let mut locals = SymbolTable::default();
        assert_eq!(eval("score()", &mut locals), 100.0);
        assert_eq!(eval("collectibles()", &mut locals), 7.0);
        assert_eq!(eval("screen_width()", &mut locals), 426.0);
        assert!((eval("dt()", &mut locals) - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(Expr::parse("1 2").is_err());
        assert!(Expr::parse("").is_err());
        assert!(Expr::parse("$").is_err());
    }

    #[test]
    fn random_is_bounded() {
        let mut locals = SymbolTable::default();
        for _ in 0..10 {
            let value = eval("random(100)", &mut locals);
            assert!((0.0..100.0).contains(&value));
        }
    }
}
