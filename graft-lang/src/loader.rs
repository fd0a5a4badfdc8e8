//! Module reading, caching, loading and export collection.
//!
//! Modules are memoized by path: each path is read at most once and
//! executed at most once per loader. Reading goes through an on-disk
//! AST cache keyed by a digest of the source text; a cached tree is
//! trusted only while its own digest and every transitive import's
//! digest are unchanged.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::fs;
use std::hash::Hasher;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use fnv::{FnvHashMap, FnvHashSet, FnvHasher};
use log::{debug, warn};

use graft_earley::{Error, Parser};
use graft_grammar::Grammar;

use crate::ast::{Flow, Node};
use crate::builtins::{self, OutSink};
use crate::context::{Context, MacroKey};
use crate::core_grammar::{add_macro_use_rule, core_grammar, drop_macro_use_rule};
use crate::error::EvalError;
use crate::tokenize::tokenize;
use crate::value::Value;

/// The suffix appended to module paths to find source files.
pub const SOURCE_EXTENSION: &str = "graft";
/// The suffix of the cached-AST blob next to each source file.
pub const CACHE_EXTENSION: &str = "graftc";

/// Why a module failed to load.
#[derive(Debug)]
pub enum LoadError {
    /// The source (or an imported source) could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The source did not parse, or parsed ambiguously.
    Parse {
        path: PathBuf,
        source: Error<Value>,
    },
    /// A module imported itself, possibly through intermediaries.
    Circular { path: String },
    /// Executing the module's tree failed.
    Eval { path: String, source: EvalError },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            LoadError::Parse { path, source } => {
                write!(f, "in file {}: {}", path.display(), source)
            }
            LoadError::Circular { path } => write!(f, "circular import of '{}'", path),
            LoadError::Eval { path, source } => write!(f, "in module '{}': {}", path, source),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Parse { source, .. } => Some(source),
            LoadError::Circular { .. } => None,
            LoadError::Eval { source, .. } => Some(source),
        }
    }
}

/// A loaded module: its tree and what it exports.
pub struct Module {
    path: String,
    body: Rc<Node>,
    exported_variables: Vec<(String, Value)>,
    exported_macros: Vec<(MacroKey, Value)>,
}

impl Module {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    /// Exported variables, in declaration order.
    pub fn exported_variables(&self) -> &[(String, Value)] {
        &self.exported_variables
    }

    /// Exported macro definitions, in definition order.
    pub fn exported_macros(&self) -> &[(MacroKey, Value)] {
        &self.exported_macros
    }
}

enum ModuleSlot {
    Loading,
    Loaded(Rc<Module>),
}

#[derive(Clone)]
struct ReadState {
    body: Rc<Node>,
    changed: bool,
}

pub(crate) struct LoaderShared {
    modules: RefCell<FnvHashMap<String, ModuleSlot>>,
    reads: RefCell<FnvHashMap<String, ReadState>>,
    reading: RefCell<FnvHashSet<String>>,
    /// Directories of the modules currently being read or executed;
    /// import paths resolve against the innermost one.
    active_dirs: RefCell<Vec<PathBuf>>,
    grammar: OnceCell<Grammar<Value>>,
    out: OutSink,
}

/// The module loader. Cloning shares all state.
#[derive(Clone)]
pub struct Loader {
    shared: Rc<LoaderShared>,
}

impl Loader {
    /// A loader whose `print` writes to standard output.
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// A loader writing built-in output to the given sink.
    pub fn with_output(out: OutSink) -> Self {
        Loader {
            shared: Rc::new(LoaderShared {
                modules: RefCell::new(FnvHashMap::default()),
                reads: RefCell::new(FnvHashMap::default()),
                reading: RefCell::new(FnvHashSet::default()),
                active_dirs: RefCell::new(Vec::new()),
                grammar: OnceCell::new(),
                out,
            }),
        }
    }

    pub(crate) fn from_shared(shared: Rc<LoaderShared>) -> Self {
        Loader { shared }
    }

    pub(crate) fn downgrade(&self) -> Weak<LoaderShared> {
        Rc::downgrade(&self.shared)
    }

    /// The core grammar, built once per loader.
    pub fn grammar(&self) -> Grammar<Value> {
        self.shared.grammar.get_or_init(|| core_grammar(self)).clone()
    }

    /// Loads the module at the given path (without its extension),
    /// executing it if this loader has not seen the path before.
    pub fn load(&self, path: &str) -> Result<Rc<Module>, LoadError> {
        {
            let modules = self.shared.modules.borrow();
            match modules.get(path) {
                Some(ModuleSlot::Loaded(module)) => return Ok(Rc::clone(module)),
                Some(ModuleSlot::Loading) => {
                    return Err(LoadError::Circular {
                        path: path.to_string(),
                    })
                }
                None => {}
            }
        }
        self.shared
            .modules
            .borrow_mut()
            .insert(path.to_string(), ModuleSlot::Loading);
        let result = self.execute_module(path);
        let mut modules = self.shared.modules.borrow_mut();
        match &result {
            Ok(module) => {
                modules.insert(path.to_string(), ModuleSlot::Loaded(Rc::clone(module)));
            }
            Err(_) => {
                modules.remove(path);
            }
        }
        result
    }

    /// Loads a module named by an `import` statement of the module
    /// currently executing.
    pub(crate) fn import(&self, raw: &str) -> Result<Rc<Module>, LoadError> {
        let resolved = self.resolve_active(raw);
        self.load(&resolved)
    }

    /// The grammar patch contributed by a module's exported macros,
    /// applied while the importing module is still being parsed.
    pub(crate) fn grammar_patch(
        &self,
        raw: &str,
        grammar: &Grammar<Value>,
    ) -> Result<Grammar<Value>, LoadError> {
        let resolved = self.resolve_active(raw);
        self.patch_at(&resolved, grammar)
    }

    /// Reads a module's tree, through the cache when possible. The flag
    /// reports whether anything had to be re-parsed.
    pub fn read(&self, path: &str) -> Result<(Rc<Node>, bool), LoadError> {
        if let Some(state) = self.shared.reads.borrow().get(path) {
            return Ok((Rc::clone(&state.body), state.changed));
        }
        if !self.shared.reading.borrow_mut().insert(path.to_string()) {
            return Err(LoadError::Circular {
                path: path.to_string(),
            });
        }
        let result = self.read_fresh(path);
        self.shared.reading.borrow_mut().remove(path);
        if let Ok((body, changed)) = &result {
            self.shared.reads.borrow_mut().insert(
                path.to_string(),
                ReadState {
                    body: Rc::clone(body),
                    changed: *changed,
                },
            );
        }
        result
    }

    fn execute_module(&self, path: &str) -> Result<Rc<Module>, LoadError> {
        let (body, _) = self.read(path)?;
        debug!("executing module {}", path);
        let context = Context::top_level(self.downgrade());
        builtins::install(&context, &self.shared.out);
        self.push_dir(path);
        let outcome = body.execute(&context);
        self.pop_dir();
        let escaped = match outcome {
            Ok(Flow::Next) => None,
            Ok(Flow::Continue) => Some(EvalError::UncaughtLoopControl("continue")),
            Ok(Flow::Break) => Some(EvalError::UncaughtLoopControl("break")),
            Ok(Flow::Return(_)) => Some(EvalError::ReturnOutsideFunction),
            Err(source) => Some(source),
        };
        if let Some(source) = escaped {
            return Err(LoadError::Eval {
                path: path.to_string(),
                source,
            });
        }

        let mut exported_variables = Vec::new();
        let mut exported_macros = Vec::new();
        if let Node::StatementSequence(statements) = body.as_ref() {
            for statement in statements {
                match statement {
                    Node::Import {
                        exported: true,
                        path: import_path,
                    } => {
                        // Re-exported imports pass their exports along.
                        let module = self.load(&resolve(path, import_path))?;
                        exported_variables.extend(module.exported_variables.iter().cloned());
                        exported_macros.extend(module.exported_macros.iter().cloned());
                    }
                    Node::VariableDeclaration {
                        exported: true,
                        name,
                    } => match context.local_value(name) {
                        Some(value) => exported_variables.push((name.clone(), value)),
                        None => warn!(
                            "exported variable '{}' in {} was never assigned",
                            name, path
                        ),
                    },
                    Node::MacroDefinition {
                        exported: true,
                        head,
                        parameters,
                        ..
                    } => {
                        let key: MacroKey = (head.clone(), parameters.clone());
                        match context.macro_definition(&key) {
                            Some(definition) => exported_macros.push((key, definition)),
                            None => {
                                warn!("exported macro '{}' in {} has no definition", head, path)
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(Rc::new(Module {
            path: path.to_string(),
            body,
            exported_variables,
            exported_macros,
        }))
    }

    fn read_fresh(&self, path: &str) -> Result<(Rc<Node>, bool), LoadError> {
        let source_path = source_path(path);
        let source = fs::read_to_string(&source_path).map_err(|source| LoadError::Io {
            path: source_path.clone(),
            source,
        })?;
        let digest = digest64(source.as_bytes());
        if let Some(body) = self.read_cache(path, digest) {
            let stale = body
                .imports()
                .iter()
                .any(|import| self.import_changed(&resolve(path, import)));
            if !stale {
                debug!("cache hit for {}", path);
                return Ok((body, false));
            }
        }
        debug!("parsing {}", path);
        let body = self.parse_module(path, &source)?;
        self.write_cache(path, digest, &body);
        Ok((body, true))
    }

    fn import_changed(&self, path: &str) -> bool {
        match self.read(path) {
            Ok((_, changed)) => changed,
            // A cycle neither confirms nor refutes freshness; let the
            // other members decide.
            Err(LoadError::Circular { .. }) => false,
            Err(_) => true,
        }
    }

    fn parse_module(&self, path: &str, source: &str) -> Result<Rc<Node>, LoadError> {
        let grammar = self.grammar();
        self.push_dir(path);
        let first = Parser::new(&grammar)
            .allow_ambiguous(false)
            .parse(tokenize(source))
            .next();
        self.pop_dir();
        match first {
            Some(Ok(value)) => Ok(value.into_node()),
            Some(Err(source)) => Err(LoadError::Parse {
                path: source_path(path),
                source,
            }),
            None => unreachable!("a default-mode parse yields a result or an error"),
        }
    }

    fn patch_at(
        &self,
        path: &str,
        grammar: &Grammar<Value>,
    ) -> Result<Grammar<Value>, LoadError> {
        let (body, _) = self.read(path)?;
        let mut grammar = grammar.clone();
        if let Node::StatementSequence(statements) = body.as_ref() {
            for statement in statements {
                match statement {
                    Node::MacroDefinition {
                        exported: true,
                        head,
                        parameters,
                        ..
                    } => {
                        grammar = add_macro_use_rule(&grammar, head, parameters);
                    }
                    Node::MacroUndefinition {
                        exported: true,
                        head,
                        parameters,
                    } => {
                        grammar = drop_macro_use_rule(&grammar, head, parameters);
                    }
                    Node::Import {
                        exported: true,
                        path: nested,
                    } => {
                        grammar = self.patch_at(&resolve(path, nested), &grammar)?;
                    }
                    _ => {}
                }
            }
        }
        Ok(grammar)
    }

    fn read_cache(&self, path: &str, digest: u64) -> Option<Rc<Node>> {
        let cache_path = cache_path(path);
        let bytes = fs::read(cache_path).ok()?;
        match bincode::deserialize::<(u64, Node)>(&bytes) {
            Ok((stored, body)) if stored == digest => Some(Rc::new(body)),
            Ok(_) => {
                debug!("stale cache for {}", path);
                None
            }
            Err(error) => {
                debug!("unreadable cache for {}: {}", path, error);
                None
            }
        }
    }

    fn write_cache(&self, path: &str, digest: u64, body: &Rc<Node>) {
        let cache_path = cache_path(path);
        match bincode::serialize(&(digest, body.as_ref())) {
            Ok(bytes) => {
                if let Err(error) = fs::write(&cache_path, bytes) {
                    debug!("cannot write cache {}: {}", cache_path.display(), error);
                }
            }
            Err(error) => debug!("cannot encode cache for {}: {}", path, error),
        }
    }

    fn push_dir(&self, path: &str) {
        let dir = Path::new(path)
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();
        self.shared.active_dirs.borrow_mut().push(dir);
    }

    fn pop_dir(&self) {
        self.shared.active_dirs.borrow_mut().pop();
    }

    fn resolve_active(&self, raw: &str) -> String {
        let dirs = self.shared.active_dirs.borrow();
        match dirs.last() {
            Some(dir) => dir.join(raw).to_string_lossy().into_owned(),
            None => raw.to_string(),
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn source_path(path: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", path, SOURCE_EXTENSION))
}

fn cache_path(path: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", path, CACHE_EXTENSION))
}

/// Resolves an imported path against the importing module's directory.
fn resolve(importer: &str, imported: &str) -> String {
    let dir = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
    dir.join(imported).to_string_lossy().into_owned()
}

fn digest64(bytes: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(bytes);
    hasher.finish()
}
