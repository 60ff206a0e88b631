//! Core library: the operator and intrinsic functions the assembler looks
//! up by name. Bodies are ordinary trees, mostly single `asm` statements.

use crate::ast::{BlockBuilder, OpKind, Operation};
use crate::atom::{Atom, AtomPool};
use crate::compile::Declaration;
use crate::function::Function;
use crate::scope::Variable;
use crate::types::{Qualifier, TypeSpecifier};

const LANES: [&str; 4] = ["x", "y", "z", "w"];

type Param<'p> = (Qualifier, TypeSpecifier, &'p str);

fn by_value<'p>(spec: TypeSpecifier, name: &'p str) -> Param<'p> {
    (Qualifier::None, spec, name)
}

fn inout<'p>(spec: TypeSpecifier, name: &'p str) -> Param<'p> {
    (Qualifier::Inout, spec, name)
}

/// Declarations of the core library, in registration order.
pub fn core(atoms: &mut AtomPool, vec4: bool) -> Vec<Declaration> {
    let mut core = Core {
        atoms,
        decls: vec![],
    };
    core.scalar(TypeSpecifier::Float);
    core.scalar(TypeSpecifier::Int);
    core.boolean();
    for n in 2..=4 {
        if vec4 && n == 4 {
            core.vec4();
        } else {
            core.vector(n);
        }
        core.scaled(n);
    }
    core.intrinsics();
    core.decls
}

struct Core<'a> {
    atoms: &'a mut AtomPool,
    decls: Vec<Declaration>,
}

impl<'a> Core<'a> {
    fn atom(&mut self, name: &str) -> Atom {
        self.atoms.atom(name)
    }

    fn id(&mut self, name: &str) -> Operation {
        Operation::ident(self.atom(name))
    }

    fn lane(&mut self, master: &str, lane: &str) -> Operation {
        let master = self.id(master);
        Operation::field(master, self.atom(lane))
    }

    /// `1`, `-1.0`, `false` or a name.
    fn operand(&mut self, text: &str) -> Operation {
        match text {
            "true" => Operation::bool(true),
            "false" => Operation::bool(false),
            _ if text.contains('.') => Operation::float(text.parse().unwrap_or_default()),
            _ => match text.parse() {
                Ok(value) => Operation::int(value),
                Err(_) => self.id(text),
            },
        }
    }

    /// One `asm` statement written as `name dst src...`.
    fn asm(&mut self, line: &str) -> Operation {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let args = words.map(|w| self.operand(w)).collect();
        Operation::asm(self.atom(name), args)
    }

    fn function(&mut self, name: &str, ret: TypeSpecifier, params: &[Param], body: Operation) {
        let atom = self.atom(name);
        let mut fun = if name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            Function::new(atom, ret)
        } else {
            Function::operator(atom, ret)
        };
        for (qualifier, spec, param) in params {
            let param = self.atom(param);
            fun = fun.param(*qualifier, spec.clone(), param);
        }
        self.decls.push(Declaration::Function(fun.body(body)));
    }

    /// `ret name(params) { ret c; asm ...; return c; }`; a void function
    /// only runs the asm lines.
    fn intrinsic(&mut self, name: &str, ret: TypeSpecifier, params: &[Param], lines: &[&str]) {
        let mut block = BlockBuilder::new();
        let result = !ret.is_void();
        if result {
            let c = self.atom("c");
            block = block.declare(Variable::new(Qualifier::None, ret.clone(), c));
        }
        for line in lines {
            block = block.stmt(self.asm(line));
        }
        if result {
            block = block.stmt(Operation::ret(Some(self.id("c"))));
        }
        self.function(name, ret, params, block.build());
    }

    /// `ret name(params) { return value; }`
    fn returning(&mut self, name: &str, ret: TypeSpecifier, params: &[Param], value: Operation) {
        let body = BlockBuilder::new().stmt(Operation::ret(Some(value))).build();
        self.function(name, ret, params, body);
    }

    fn scalar(&mut self, t: TypeSpecifier) {
        use TypeSpecifier::Bool;
        let int = t == TypeSpecifier::Int;
        let (one, minus_one) = if int { ("1", "-1") } else { ("1.0", "-1.0") };
        let ab = [by_value(t.clone(), "a"), by_value(t.clone(), "b")];
        let a = [by_value(t.clone(), "a")];

        self.intrinsic("+", t.clone(), &ab, &["float_add c a b"]);
        self.intrinsic("-", t.clone(), &ab, &["float_negate c b", "float_add c a c"]);
        self.intrinsic("*", t.clone(), &ab, &["float_multiply c a b"]);
        if int {
            self.intrinsic("/", t.clone(), &ab, &["float_divide c a b", "float_to_int c c"]);
        } else {
            self.intrinsic("/", t.clone(), &ab, &["float_divide c a b"]);
        }
        self.intrinsic("-", t.clone(), &a, &["float_negate c a"]);

        self.intrinsic("<", Bool, &ab, &["float_less c a b"]);
        self.intrinsic(">", Bool, &ab, &["float_less c b a"]);
        self.intrinsic("<=", Bool, &ab, &["float_less c b a", "float_equal c c false"]);
        self.intrinsic(">=", Bool, &ab, &["float_less c a b", "float_equal c c false"]);

        let target = [inout(t.clone(), "a"), by_value(t.clone(), "b")];
        let void = TypeSpecifier::Void;
        self.intrinsic("+=", void.clone(), &target, &["float_add a a b"]);
        self.intrinsic("-=", void.clone(), &target, &["float_negate b b", "float_add a a b"]);
        self.intrinsic("*=", void.clone(), &target, &["float_multiply a a b"]);
        if int {
            self.intrinsic("/=", void.clone(), &target, &["float_divide a a b", "float_to_int a a"]);
        } else {
            self.intrinsic("/=", void.clone(), &target, &["float_divide a a b"]);
        }

        let target = [inout(t.clone(), "a")];
        let inc = format!("float_add a a {one}");
        let dec = format!("float_add a a {minus_one}");
        self.intrinsic("++", void.clone(), &target, &[inc.as_str()]);
        self.intrinsic("--", void, &target, &[dec.as_str()]);

        // postfix forms return the old value; `d` only tells them apart
        let target = [inout(t.clone(), "a"), by_value(TypeSpecifier::Int, "d")];
        for (name, line) in [("++", &inc), ("--", &dec)] {
            let c = self.atom("c");
            let old = Variable::new(Qualifier::None, t.clone(), c).with_initializer(self.id("a"));
            let body = BlockBuilder::new()
                .declare(old)
                .stmt(self.asm(line))
                .stmt(Operation::ret(Some(self.id("c"))))
                .build();
            self.function(name, t.clone(), &target, body);
        }
    }

    fn boolean(&mut self) {
        use TypeSpecifier::Bool;
        self.intrinsic("!", Bool, &[by_value(Bool, "a")], &["float_equal c a false"]);
        self.intrinsic(
            "^^",
            Bool,
            &[by_value(Bool, "a"), by_value(Bool, "b")],
            &["float_equal c a b", "float_equal c c false"],
        );
    }

    /// `spec(f(x), f(y), ...)` over the first `n` lanes.
    fn lanes(&mut self, spec: &TypeSpecifier, n: usize, f: impl Fn(&mut Self, &str) -> Operation) -> Operation {
        let args = LANES[..n].iter().map(|lane| f(self, *lane)).collect();
        Operation::call(self.atom(spec.name()), args)
    }

    /// Component-wise float vector operators, built from the scalar ones.
    fn vector(&mut self, n: usize) {
        use TypeSpecifier::Float;
        let Some(v) = TypeSpecifier::vector(&Float, n as u32) else {
            return;
        };
        let ab = [by_value(v.clone(), "a"), by_value(v.clone(), "b")];
        for kind in [OpKind::Add, OpKind::Subtract, OpKind::Multiply, OpKind::Divide] {
            let value = self.lanes(&v, n, |core, lane| {
                Operation::binary(kind, core.lane("a", lane), core.lane("b", lane))
            });
            self.returning(kind.operator().unwrap_or_default(), v.clone(), &ab, value);
        }

        let value = self.lanes(&v, n, |core, lane| {
            Operation::unary(OpKind::Minus, core.lane("a", lane))
        });
        self.returning("-", v.clone(), &[by_value(v.clone(), "a")], value);

        let dot = LANES[..n]
            .iter()
            .map(|lane| Operation::binary(OpKind::Multiply, self.lane("a", lane), self.lane("b", lane)))
            .reduce(|sum, term| Operation::binary(OpKind::Add, sum, term))
            .unwrap_or_else(|| Operation::float(0.0));
        self.returning("dot", Float, &ab, dot);

        // `a op= b` is `a = a op b`
        for (name, kind, rhs) in [
            ("+=", OpKind::Add, v.clone()),
            ("-=", OpKind::Subtract, v.clone()),
            ("*=", OpKind::Multiply, v.clone()),
            ("/=", OpKind::Divide, v.clone()),
        ] {
            self.compound(name, kind, &v, rhs);
        }
    }

    /// `void name(inout v a, rhs b) { a = a op b; }`
    fn compound(&mut self, name: &str, kind: OpKind, v: &TypeSpecifier, rhs: TypeSpecifier) {
        let update = Operation::assign(
            self.id("a"),
            Operation::binary(kind, self.id("a"), self.id("b")),
        );
        let body = BlockBuilder::new().expr(update).build();
        self.function(
            name,
            TypeSpecifier::Void,
            &[inout(v.clone(), "a"), by_value(rhs, "b")],
            body,
        );
    }

    /// Float vector by scalar operators, shared by both vec4 modes.
    fn scaled(&mut self, n: usize) {
        use TypeSpecifier::Float;
        let Some(v) = TypeSpecifier::vector(&Float, n as u32) else {
            return;
        };
        let vs = [by_value(v.clone(), "v"), by_value(Float, "s")];
        for kind in [OpKind::Multiply, OpKind::Divide] {
            let value = self.lanes(&v, n, |core, lane| {
                Operation::binary(kind, core.lane("v", lane), core.id("s"))
            });
            self.returning(kind.operator().unwrap_or_default(), v.clone(), &vs, value);
        }
        let sv = [by_value(Float, "s"), by_value(v.clone(), "v")];
        let value = self.lanes(&v, n, |core, lane| {
            Operation::binary(OpKind::Multiply, core.id("s"), core.lane("v", lane))
        });
        self.returning("*", v.clone(), &sv, value);

        self.compound("*=", OpKind::Multiply, &v, Float);
        self.compound("/=", OpKind::Divide, &v, Float);
    }

    /// `vec4 name(params) { vec4 c = a; asm line; return c; }`
    fn updated(&mut self, name: &str, params: &[Param], line: &str) {
        let c = self.atom("c");
        let body = BlockBuilder::new()
            .declare(
                Variable::new(Qualifier::None, TypeSpecifier::Vec4, c).with_initializer(self.id("a")),
            )
            .stmt(self.asm(line))
            .stmt(Operation::ret(Some(self.id("c"))))
            .build();
        self.function(name, TypeSpecifier::Vec4, params, body);
    }

    /// `vec4` operators on the vec4 instructions.
    fn vec4(&mut self) {
        use TypeSpecifier::{Float, Vec4, Void};
        let ab = [by_value(Vec4, "a"), by_value(Vec4, "b")];
        self.updated("+", &ab, "vec4_add c b");
        self.updated("-", &ab, "vec4_subtract c b");
        self.updated("*", &ab, "vec4_multiply c b");
        self.updated("/", &ab, "vec4_divide c b");
        self.updated("-", &[by_value(Vec4, "a")], "vec4_negate c");

        let c = self.atom("c");
        let body = BlockBuilder::new()
            .declare(Variable::new(Qualifier::None, Vec4, c).with_initializer(self.id("a")))
            .stmt(self.asm("vec4_dot c b"))
            .stmt(Operation::ret(Some(self.lane("c", "x"))))
            .build();
        self.function("dot", Float, &ab, body);

        for (name, line) in [
            ("+=", "vec4_add a b"),
            ("-=", "vec4_subtract a b"),
            ("*=", "vec4_multiply a b"),
            ("/=", "vec4_divide a b"),
        ] {
            self.intrinsic(name, Void, &[inout(Vec4, "a"), by_value(Vec4, "b")], &[line]);
        }
    }

    fn intrinsics(&mut self) {
        use TypeSpecifier::*;
        let x = [by_value(Float, "x")];
        self.intrinsic("sin", Float, &x, &["float_sine c x"]);
        self.intrinsic("asin", Float, &x, &["float_arcsine c x"]);
        self.intrinsic("atan", Float, &x, &["float_arctan c x"]);
        self.intrinsic(
            "pow",
            Float,
            &[by_value(Float, "x"), by_value(Float, "y")],
            &["float_power c x y"],
        );
        self.intrinsic("log2", Float, &x, &["float_log2 c x"]);
        self.intrinsic("floor", Float, &x, &["float_floor c x"]);
        self.intrinsic("ceil", Float, &x, &["float_ceil c x"]);

        self.intrinsic("noise1", Float, &x, &["float_noise1 c x"]);
        self.intrinsic("noise2", Float, &[by_value(Vec2, "x")], &["float_noise2 c x"]);
        self.intrinsic("noise3", Float, &[by_value(Vec3, "x")], &["float_noise3 c x"]);
        self.intrinsic("noise4", Float, &[by_value(Vec4, "x")], &["float_noise4 c x"]);

        // one float fills every component
        self.intrinsic("vec4", Vec4, &[by_value(Float, "f")], &["float_to_vec4 c f"]);
        for n in 2..=3 {
            let Some(v) = TypeSpecifier::vector(&Float, n as u32) else {
                continue;
            };
            let args = (0..n).map(|_| self.id("f")).collect();
            let value = Operation::call(self.atom(v.name()), args);
            self.returning(v.name(), v.clone(), &[by_value(Float, "f")], value);
        }

        self.intrinsic("int", Int, &[by_value(Float, "f")], &["float_to_int c f"]);
        self.intrinsic("float", Float, &[by_value(Int, "i")], &["int_to_float c i"]);

        self.intrinsic("print", Void, &[by_value(Float, "a")], &["float_print a"]);
        self.intrinsic("print", Void, &[by_value(Int, "a")], &["int_print a"]);
        self.intrinsic("print", Void, &[by_value(Bool, "a")], &["bool_print a"]);

        for (name, sampler, coord, op) in [
            ("texture1D", Sampler1D, Float, "vec4_tex1d"),
            ("texture2D", Sampler2D, Vec2, "vec4_tex2d"),
            ("texture3D", Sampler3D, Vec3, "vec4_tex3d"),
            ("textureCube", SamplerCube, Vec3, "vec4_texcube"),
            ("shadow1D", Sampler1DShadow, Vec3, "vec4_shad1d"),
            ("shadow2D", Sampler2DShadow, Vec3, "vec4_shad2d"),
        ] {
            let line = format!("{op} c s p 0.0");
            self.intrinsic(
                name,
                Vec4,
                &[by_value(sampler, "s"), by_value(coord, "p")],
                &[line.as_str()],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionKind;

    fn find<'d>(decls: &'d [Declaration], atoms: &AtomPool, name: &str, params: &[TypeSpecifier]) -> Option<&'d Function> {
        let name = atoms.find(name)?;
        decls.iter().find_map(|d| match d {
            Declaration::Function(f)
                if f.name() == name
                    && f.formals().len() == params.len()
                    && f.formals().iter().zip(params).all(|(p, t)| &p.ty.specifier == t) =>
            {
                Some(f)
            }
            _ => None,
        })
    }

    #[test]
    fn operators_are_registered_by_name() {
        use TypeSpecifier::*;
        let mut atoms = AtomPool::new();
        let decls = core(&mut atoms, false);

        let add = find(&decls, &atoms, "+", &[Float, Float]).unwrap();
        assert_eq!(add.ret(), &Float);
        assert_eq!(add.kind, FunctionKind::Operator);
        assert_eq!(find(&decls, &atoms, "sin", &[Float]).unwrap().kind, FunctionKind::Ordinary);
        let body = add.body.as_ref().unwrap();
        assert_eq!(body.children[1].kind, OpKind::Asm);
        assert_eq!(body.children[1].children.len(), 3);

        let post = find(&decls, &atoms, "++", &[Int, Int]).unwrap();
        assert_eq!(post.ret(), &Int);
        assert_eq!(post.formals()[0].ty.qualifier, Qualifier::Inout);
        let pre = find(&decls, &atoms, "++", &[Int]).unwrap();
        assert!(pre.ret().is_void());

        assert!(find(&decls, &atoms, "dot", &[Vec3, Vec3]).is_some());
        assert!(find(&decls, &atoms, "*", &[Float, Vec2]).is_some());
        assert!(find(&decls, &atoms, "texture2D", &[Sampler2D, Vec2]).is_some());
        assert!(find(&decls, &atoms, "print", &[Bool]).is_some());
    }

    #[test]
    fn float_splats() {
        use TypeSpecifier::*;
        let mut atoms = AtomPool::new();
        let decls = core(&mut atoms, false);

        let vec4 = find(&decls, &atoms, "vec4", &[Float]).unwrap();
        let asm = &vec4.body.as_ref().unwrap().children[1];
        assert_eq!(asm.name.map(|a| atoms.id(a).to_string()).as_deref(), Some("float_to_vec4"));

        // the two component constructor call inside is not itself a splat
        let vec2 = find(&decls, &atoms, "vec2", &[Float]).unwrap();
        let ret = &vec2.body.as_ref().unwrap().children[0];
        assert_eq!(ret.children[0].kind, OpKind::Call);
        assert_eq!(ret.children[0].children.len(), 2);
        assert!(find(&decls, &atoms, "vec3", &[Float]).is_some());
        assert!(find(&decls, &atoms, "vec2", &[Float, Float]).is_none());
    }

    #[test]
    fn operand_literals() {
        let mut atoms = AtomPool::new();
        let mut core = Core {
            atoms: &mut atoms,
            decls: vec![],
        };
        let op = core.asm("float_add a a -1.0");
        assert_eq!(op.children[2].kind, OpKind::LiteralFloat);
        assert_eq!(op.children[2].literal, -1.0);
        let op = core.asm("float_equal c c false");
        assert_eq!(op.children[2].kind, OpKind::LiteralBool);
        let op = core.asm("float_add a a 1");
        assert_eq!(op.children[2].kind, OpKind::LiteralInt);
        assert_eq!(op.children[0].kind, OpKind::Identifier);
    }

    #[test]
    fn vec4_mode_uses_vector_instructions() {
        let mut atoms = AtomPool::new();
        let decls = core(&mut atoms, true);
        let add = find(&decls, &atoms, "+", &[TypeSpecifier::Vec4, TypeSpecifier::Vec4]).unwrap();
        let asm = &add.body.as_ref().unwrap().children[1];
        assert_eq!(asm.kind, OpKind::Asm);
        assert_eq!(asm.name.map(|a| atoms.id(a).to_string()).as_deref(), Some("vec4_add"));
    }
}
