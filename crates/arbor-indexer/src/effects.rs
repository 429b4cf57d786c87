//! Side-effect classification from call names and file imports

use regex::Regex;
use tracing::warn;

/// Rules below this confidence never tag a unit.
pub const MIN_CONFIDENCE: f32 = 0.5;

/// Declarative rule: any matching call, optionally gated on an import,
/// tags the unit with `category`.
struct RuleSpec {
    category: &'static str,
    confidence: f32,
    /// Substrings of which at least one import must contain. Empty means ungated.
    imports: &'static [&'static str],
    calls: &'static [&'static str],
}

const RULES: &[RuleSpec] = &[
    RuleSpec {
        category: "database",
        confidence: 0.8,
        imports: &[],
        calls: &[
            r"(?i)^(db|conn|connection|cursor|pool|session|tx|transaction)\.(query|execute|exec|executemany|prepare|commit|rollback|fetch\w*)$",
            r"^(prisma|knex|sequelize|mongoose)\.",
            r"(?i)\.(find_one|findone|findmany|insert_one|insertone|insertmany|update_one|updateone|delete_one|deleteone|aggregate)$",
            r"^sqlx::query\w*$",
        ],
    },
    RuleSpec {
        category: "database",
        confidence: 0.7,
        imports: &[
            "sqlite3", "psycopg", "sqlalchemy", "pymysql", "database/sql", "java.sql",
            "rusqlite", "sqlx", "diesel", "mysql", "mongodb", "pg",
        ],
        calls: &[r"(?i)(^|\.)(query|execute|exec|commit|rollback|cursor|connect|prepare\w*)$"],
    },
    RuleSpec {
        category: "network",
        confidence: 0.8,
        imports: &[],
        calls: &[
            r"^(fetch|axios)$",
            r"^(axios|requests|httpx|aiohttp|urllib\.request|http|https|reqwest)[.:]",
            r"^(net\.(Dial|Listen)\w*|http\.(Get|Post|Head|NewRequest)\w*)$",
            r"(?i)^(websocket|socket)\b",
            r"^HttpClient\.",
        ],
    },
    RuleSpec {
        category: "network",
        confidence: 0.6,
        imports: &["requests", "axios", "httpx", "reqwest", "net/http", "java.net", "node-fetch"],
        calls: &[r"\.(get|post|put|patch|delete|send|request)$"],
    },
    RuleSpec {
        category: "filesystem",
        confidence: 0.8,
        imports: &[],
        calls: &[
            r"^(open|fopen|fread|fwrite|fclose|remove|unlink|mkdir|rmdir)$",
            r"^(fs|fsPromises|shutil|ioutil|pathlib|Files)\.",
            r"^(std::)?fs::",
            r"^File::(open|create)$",
            r"^os\.(Open|OpenFile|Create|ReadFile|WriteFile|Remove|RemoveAll|Mkdir|MkdirAll|remove|unlink|mkdir|makedirs|listdir|rename)$",
            r"^os\.path\.",
            r"(?i)^(readFile|writeFile|readFileSync|writeFileSync|appendFile|appendFileSync)$",
        ],
    },
    RuleSpec {
        category: "process",
        confidence: 0.8,
        imports: &[],
        calls: &[
            r"^(subprocess|child_process)\.",
            r"^(exec|execSync|execFile|spawn|spawnSync|system|popen|fork)$",
            r"^os\.(system|popen|exec\w*|spawn\w*|kill|_exit|Exit)$",
            r"^exec\.Command(Context)?$",
            r"^(std::)?process::(exit|abort)$",
            r"^Command::new$",
            r"^Runtime\.getRuntime\.exec$",
            r"^process\.exit$",
        ],
    },
    RuleSpec {
        category: "logging",
        confidence: 0.6,
        imports: &[],
        calls: &[
            r"^console\.(log|warn|error|info|debug|trace)$",
            r"^(log|logger|logging|tracing|slog)[.:]",
            r"^(print|printf|fprintf|puts|perror)$",
            r"^(println|eprintln|print|eprint|dbg)!$",
            r"^((tracing|log)::)?(info|warn|error|debug|trace)!$",
            r"^fmt\.(Print|Println|Printf|Fprint\w*)$",
            r"^System\.(out|err)\.print\w*$",
            r"(?i)^(this|self)\.(log|logger)\.",
        ],
    },
    RuleSpec {
        category: "environment",
        confidence: 0.7,
        imports: &[],
        calls: &[
            r"^os\.(getenv|putenv|Getenv|LookupEnv|Setenv|Unsetenv|environ\.get)$",
            r"^(std::)?env::(var|var_os|vars|set_var|remove_var)$",
            r"^process\.env\.",
            r"^(getenv|setenv)$",
            r"^System\.(getenv|getProperty)$",
        ],
    },
    RuleSpec {
        category: "time",
        confidence: 0.5,
        imports: &[],
        calls: &[
            r"^(Date\.now|performance\.now|setTimeout|setInterval|sleep|usleep)$",
            r"^time\.(sleep|time|monotonic|Now|Sleep|Since|After|Tick)$",
            r"^datetime\.(now|utcnow|today)$",
            r"^datetime\.datetime\.(now|utcnow|today)$",
            r"^(Instant|SystemTime|Utc|Local)::now$",
            r"^(std::)?thread::sleep$",
            r"^System\.(currentTimeMillis|nanoTime)$",
        ],
    },
    RuleSpec {
        category: "random",
        confidence: 0.5,
        imports: &[],
        calls: &[
            r"^Math\.random$",
            r"^random\.\w+$",
            r"^rand(::\w+)*$",
            r"^rand\.\w+$",
            r"^(thread_rng|srand|uuid\.uuid4|crypto\.randomUUID|crypto\.randomBytes)$",
        ],
    },
];

/// A compiled rule.
struct EffectRule {
    category: &'static str,
    confidence: f32,
    imports: &'static [&'static str],
    calls: Vec<Regex>,
}

impl EffectRule {
    fn applies(&self, calls: &[String], imports: &[String]) -> bool {
        let gated_in = self.imports.is_empty()
            || imports
                .iter()
                .any(|i| self.imports.iter().any(|needle| import_matches(i, needle)));
        gated_in && calls.iter().any(|c| self.calls.iter().any(|re| re.is_match(c)))
    }
}

/// Modules match on whole path segments so `pg` does not match `pgettext`.
fn import_matches(import: &str, needle: &str) -> bool {
    import == needle
        || import
            .split(|c: char| matches!(c, '/' | '.' | ':' | '@' | '-'))
            .any(|segment| segment == needle)
        || (needle.contains(['/', '.', '-']) && import.contains(needle))
}

/// Classifier built once per run and shared by every worker.
pub struct EffectClassifier {
    rules: Vec<EffectRule>,
}

impl Default for EffectClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectClassifier {
    pub fn new() -> Self {
        let rules = RULES
            .iter()
            .map(|spec| EffectRule {
                category: spec.category,
                confidence: spec.confidence,
                imports: spec.imports,
                calls: spec
                    .calls
                    .iter()
                    .filter_map(|pattern| match Regex::new(pattern) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            warn!("Skipping invalid effect pattern {}: {}", pattern, e);
                            None
                        }
                    })
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// Effect categories for a unit, sorted and without duplicates.
    pub fn classify(&self, calls: &[String], imports: &[String]) -> Vec<String> {
        let mut effects: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| rule.confidence >= MIN_CONFIDENCE)
            .filter(|rule| rule.applies(calls, imports))
            .map(|rule| rule.category.to_string())
            .collect();
        effects.sort_unstable();
        effects.dedup();
        effects
    }
}
