//! Compile driver: registers declarations, assembles function bodies,
//! allocates and pre-evaluates globals, and publishes the export tables.

use arch::{InstructionStream, Opcode};
use emu::{Backend, Image, Interpreter, Machine};
use log::{debug, warn};

use crate::assemble::{Assembler, Frame, RefMode};
use crate::ast::Operation;
use crate::atom::AtomPool;
use crate::builtin;
use crate::config::Config;
use crate::error::Error;
use crate::export::{DataEntry, Exports, Quantity};
use crate::function::{Function, FunctionScope, StructScope};
use crate::scope::{Scope, ScopeChain, Variable};
use crate::storage::size_of;
use crate::typeinfo::Space;
use crate::types::{StructDef, TypeSpecifier};

/// One top-level item of a translation unit, in source order.
#[derive(Debug, Clone)]
pub enum Declaration {
    Struct(StructDef),
    Variable(Variable),
    Function(Function),
}

/// Everything declared at the top level of one unit.
#[derive(Debug, Default)]
pub struct TranslationUnit {
    pub vars: Scope,
    pub funs: Vec<Function>,
    pub structs: Vec<StructDef>,
}

impl TranslationUnit {
    pub fn function(&self, name: &str, atoms: &AtomPool) -> Option<&Function> {
        self.scope().find_by_name(atoms.find(name)?)
    }

    fn scope(&self) -> FunctionScope<'_> {
        FunctionScope {
            functions: &self.funs,
            outer: None,
        }
    }
}

/// A compiled program: the core library, one user unit on top of it, the
/// code of both and the machine holding their globals.
pub struct CodeObject {
    pub atoms: AtomPool,
    pub stream: InstructionStream,
    pub machine: Machine,
    pub config: Config,
    pub builtin: TranslationUnit,
    pub unit: TranslationUnit,
    pub exports: Exports,
    pool: u32,
}

impl CodeObject {
    /// A code object with the core library already assembled.
    pub fn new(config: Config) -> Result<Self, Error> {
        let mut atoms = AtomPool::new();
        let core = builtin::core(&mut atoms, config.vec4);
        let mut obj = CodeObject {
            atoms,
            stream: InstructionStream::new(),
            machine: Machine::new(config.global_size, config.stack_size),
            config,
            builtin: TranslationUnit::default(),
            unit: TranslationUnit::default(),
            exports: Exports::default(),
            pool: 0,
        };

        let mut compiler = Compiler {
            atoms: &obj.atoms,
            stream: &mut obj.stream,
            machine: &mut obj.machine,
            config: &obj.config,
            outer: None,
            pool: &mut obj.pool,
        };
        compiler.unit(&mut obj.builtin, core)?;
        debug!(
            "core library: {} functions, {} instructions",
            obj.builtin.funs.len(),
            obj.stream.len()
        );
        Ok(obj)
    }

    /// Compiles `decls` into the user unit and rebuilds the export tables.
    /// The first error is also written to the info log.
    pub fn compile(&mut self, decls: Vec<Declaration>) -> Result<(), Error> {
        let mut compiler = Compiler {
            atoms: &self.atoms,
            stream: &mut self.stream,
            machine: &mut self.machine,
            config: &self.config,
            outer: Some(&self.builtin),
            pool: &mut self.pool,
        };
        let result = compiler
            .unit(&mut self.unit, decls)
            .and_then(|()| compiler.export(&self.unit));
        match result {
            Ok(exports) => {
                self.exports = exports;
                Ok(())
            }
            Err(e) => {
                self.machine.infolog.error(&e);
                Err(e)
            }
        }
    }

    /// Runs the code entry `entry` on the program's machine with the
    /// interpreter. Globals are kept between runs. Returns the kill flag.
    pub fn execute(&mut self, entry: &str) -> Result<bool, Error> {
        let mut interp = Interpreter::new().with_max_steps(self.config.max_steps);
        self.execute_with(entry, &mut interp)
    }

    pub fn execute_with(&mut self, entry: &str, backend: &mut dyn Backend) -> Result<bool, Error> {
        let ip = self
            .exports
            .find_code(entry)
            .ok_or_else(|| emu::Error::UnknownEntry(entry.to_string()))?;
        self.machine.reset(ip);
        backend.run(&self.stream, &mut self.machine)?;
        Ok(self.machine.kill)
    }

    pub fn image(&self) -> Image {
        Image {
            global_size: self.config.global_size,
            stack_size: self.config.stack_size,
            code: self.stream.clone(),
            globals: self.machine.globals().to_vec(),
            entries: self.exports.code.clone(),
        }
    }
}

/// Borrows the parts of a `CodeObject` needed to compile one unit.
struct Compiler<'a> {
    atoms: &'a AtomPool,
    stream: &'a mut InstructionStream,
    machine: &'a mut Machine,
    config: &'a Config,
    outer: Option<&'a TranslationUnit>,
    pool: &'a mut u32,
}

impl<'a> Compiler<'a> {
    fn id(&self, name: crate::atom::Atom) -> String {
        self.atoms.id(name).to_string()
    }

    fn unit(&mut self, unit: &mut TranslationUnit, decls: Vec<Declaration>) -> Result<(), Error> {
        for decl in decls {
            match decl {
                Declaration::Struct(def) => self.structure(unit, def)?,
                Declaration::Variable(var) => self.global(unit, var)?,
                Declaration::Function(fun) => self.function(unit, fun)?,
            }
        }
        match unit
            .funs
            .iter()
            .find(|f| f.body.is_none() && !f.fixups.borrow().is_empty())
        {
            Some(fun) => Err(Error::UndefinedFunction(self.id(fun.name()))),
            None => Ok(()),
        }
    }

    /// Runs `f` with an assembler that sees `unit` on top of the outer unit.
    fn assemble<R>(
        &mut self,
        unit: &TranslationUnit,
        f: impl FnOnce(Assembler<'_>, &ScopeChain<'_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let empty = Scope::new();
        let outer_funs = self.outer.map(|u| FunctionScope {
            functions: &u.funs,
            outer: None,
        });
        let outer_structs = self.outer.map(|u| StructScope {
            structs: &u.structs,
            outer: None,
        });
        let space = Space {
            funs: FunctionScope {
                functions: &unit.funs,
                outer: outer_funs.as_ref(),
            },
            structs: StructScope {
                structs: &unit.structs,
                outer: outer_structs.as_ref(),
            },
            atoms: self.atoms,
        };
        let root = ScopeChain::root(self.outer.map_or(&empty, |u| &u.vars));
        let globals = root.enter(&unit.vars);
        f(Assembler::new(self.stream, space, self.config.vec4), &globals)
    }

    fn structure(&mut self, unit: &mut TranslationUnit, def: StructDef) -> Result<(), Error> {
        if let Some(name) = def.name {
            if unit.structs.iter().any(|s| s.name == Some(name)) {
                return Err(Error::DuplicateType(self.id(name)));
            }
        }
        unit.structs.push(def);
        Ok(())
    }

    /// Registers `fun`: a definition completes an earlier prototype, a second
    /// definition is an error and a repeated prototype is dropped.
    fn function(&mut self, unit: &mut TranslationUnit, mut fun: Function) -> Result<(), Error> {
        let index = match unit.scope().position(&fun) {
            Some(i) => {
                let existing = &mut unit.funs[i];
                match (existing.body.is_some(), fun.body.is_some()) {
                    (true, true) => return Err(Error::FunctionRedefined(self.id(fun.name()))),
                    (false, true) => {
                        *fun.fixups.get_mut() = existing.fixups.take();
                        *existing = fun;
                        i
                    }
                    _ => return Ok(()),
                }
            }
            None => {
                let outer = self.outer.map(TranslationUnit::scope);
                let visible = FunctionScope {
                    functions: &unit.funs,
                    outer: outer.as_ref(),
                };
                if visible.find(&fun, true).is_some() {
                    debug!("{} hides a core library function", self.id(fun.name()));
                }
                unit.funs.push(fun);
                unit.funs.len() - 1
            }
        };

        if unit.funs[index].body.is_none() {
            return Ok(());
        }
        let frame = Frame::layout(&mut unit.funs[index], self.config.vec4);
        let unit = &*unit;
        self.assemble(unit, |mut asm, globals| {
            asm.function(&unit.funs[index], frame, globals)
        })
    }

    /// Allocates `var` in global memory, then zeroes it or runs its initializer.
    fn global(&mut self, unit: &mut TranslationUnit, mut var: Variable) -> Result<(), Error> {
        var.global = true;
        var.size = size_of(&var.ty.specifier, var.array_len, self.config.vec4);
        let open_array = matches!(var.ty.specifier, TypeSpecifier::Array(_)) && var.array_len == 0;

        if !open_array {
            let limit = self.config.global_size * 4;
            if *self.pool + var.size > limit {
                return Err(Error::OutOfMemory(var.size));
            }
            var.address = *self.pool;
            *self.pool += var.size;

            match var.initializer.as_deref() {
                Some(init) => self.initialize(unit, &var, init)?,
                None => self.machine.zero(var.address, var.size)?,
            }
        }
        unit.vars.push(var);
        Ok(())
    }

    /// Evaluates `var = init` once on a scratch copy of the machine, keeps
    /// the bytes of `var` and discards the code.
    fn initialize(&mut self, unit: &TranslationUnit, var: &Variable, init: &Operation) -> Result<(), Error> {
        let point = self.stream.save();
        let start = self.stream.len();
        let frame = Frame::scratch();
        self.stream.push_label(Opcode::LocalAlloc, frame.local_size);
        self.stream.push_label(Opcode::Enter, frame.local_size);

        let mut target = Operation::ident(var.name);
        target.locals.push(var.clone());
        let assign = Operation::assign(target, init.clone());
        self.assemble(unit, |asm, globals| {
            asm.with_frame(frame)
                .operation(&assign, globals, RefMode::Forbid)
        })?;
        self.stream.push(Opcode::Exit);

        let mut scratch = self.machine.clone();
        scratch.reset(start);
        let mut interp = Interpreter::new().with_max_steps(self.config.max_steps);
        let run = interp.run(self.stream, &mut scratch);
        self.stream.restore(point);
        run?;

        self.machine.copy_from(&scratch, var.address, var.size)?;
        self.machine.infolog = scratch.infolog;
        debug!(
            "{} initialized at {}, {} bytes",
            self.atoms.id(var.name),
            var.address,
            var.size
        );
        Ok(())
    }

    /// Data entries for every global of `unit` and a `@main` code entry.
    fn export(&mut self, unit: &TranslationUnit) -> Result<Exports, Error> {
        let mut exports = Exports::default();
        for var in &unit.vars.variables {
            exports.data.push(DataEntry {
                class: var.ty.qualifier.into(),
                quantity: Quantity::of(var, self.atoms, self.config.vec4),
                address: var.address,
            });
        }

        let main = self
            .atoms
            .find("main")
            .and_then(|name| unit.scope().find_by_name(name))
            .filter(|f| f.body.is_some());
        let Some(main) = main else {
            warn!("no main function, nothing to export");
            self.machine.infolog.warning("no 'main' function to export");
            return Ok(exports);
        };

        // main returns into a frame of its own caller
        let stub = self.stream.len();
        let frame = Frame::scratch();
        self.stream.push_label(Opcode::LocalAlloc, frame.local_size);
        self.stream.push_label(Opcode::Enter, frame.local_size);
        let ret = size_of(main.ret(), 0, self.config.vec4);
        if ret != 0 {
            self.stream.push_label(Opcode::LocalAlloc, ret);
        }
        self.stream.push_label(Opcode::Call, main.address.get());
        self.stream.push(Opcode::Exit);
        exports.code.insert("@main".to_string(), stub);
        Ok(exports)
    }
}
