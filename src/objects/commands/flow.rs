use crate::components::fatal;
use crate::objects::commands::{run_chain, Command, Cx, Flow, RenderCx};
use crate::objects::expression::Expr;

fn is_true(value: f32) -> bool {
    value.abs() >= 1e-5
}

/// Evaluates an expression for its side effects (assignments).
pub struct Let {
    pub expr: Expr,
}

impl Command for Let {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.eval(&self.expr);
        Flow::Continue
    }
}

/// Switches state when the condition holds (or, negated, when it doesn't).
/// A taken branch ends the frame for this chain.
pub struct Branch {
    pub condition: Expr,
    pub new_state: String,
    pub negate: bool,
}

impl Command for Branch {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let taken = is_true(cx.eval(&self.condition)) != self.negate;
        if taken {
            if let Err(e) = cx.ent.vm.set_current_state(&self.new_state) {
                fatal(&format!("object \"{}\": {e}", cx.ent.name));
            }
            Flow::Halt
        } else {
            Flow::Continue
        }
    }
}

/// Pops the VM history; the rest of the chain does not run.
pub struct ReturnToPreviousState;

impl Command for ReturnToPreviousState {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.ent.vm.return_to_previous_state();
        Flow::Halt
    }
}

#[derive(Clone)]
pub enum ExecuteMode {
    Always,
    If(Expr),
    Unless(Expr),
    While(Expr),
    For {
        init: Expr,
        condition: Expr,
        step: Expr,
    },
}

/// Runs another state of the same VM inline; the outer chain continues
/// afterwards. Loop variants bail out as soon as the entity switches state.
pub struct Execute {
    pub state_name: String,
    pub mode: ExecuteMode,
}

impl Execute {
    fn state_index(&self, cx: &Cx) -> usize {
        match cx.ent.vm.state_index(&self.state_name) {
            Some(index) => index,
            None => fatal(&format!(
                "object \"{}\": can't find state \"{}\"",
                cx.ent.name, self.state_name
            )),
        }
    }

    fn run_state(index: usize, cx: &mut Cx) {
        let mut chain = cx.ent.vm.take_chain(index);
        run_chain(&mut chain, cx);
        cx.ent.vm.put_chain(index, chain);
    }
}

impl Command for Execute {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let index = self.state_index(cx);
        match &self.mode {
            ExecuteMode::Always => Self::run_state(index, cx),
            ExecuteMode::If(condition) => {
                if is_true(cx.eval(condition)) {
                    Self::run_state(index, cx);
                }
            }
            ExecuteMode::Unless(condition) => {
                if !is_true(cx.eval(condition)) {
                    Self::run_state(index, cx);
                }
            }
            ExecuteMode::While(condition) => {
                let serial = cx.ent.vm.switch_serial();
                while is_true(cx.eval(condition)) {
                    Self::run_state(index, cx);
                    if cx.ent.vm.switch_serial() != serial {
                        break;
                    }
                }
            }
            ExecuteMode::For {
                init,
                condition,
                step,
            } => {
                let serial = cx.ent.vm.switch_serial();
                cx.eval(init);
                while is_true(cx.eval(condition)) {
                    Self::run_state(index, cx);
                    if cx.ent.vm.switch_serial() != serial {
                        break;
                    }
                    cx.eval(step);
                }
            }
        }
        Flow::Continue
    }

    fn render(&self, rx: &mut RenderCx) {
        let ent = rx.ent;
        if let Some(index) = ent.vm.state_index(&self.state_name) {
            // the chain of the referenced state renders inline
            if index != ent.vm.current_index() {
                for command in ent.vm.chain(index).iter() {
                    command.render(rx);
                }
            }
        }
    }
}
