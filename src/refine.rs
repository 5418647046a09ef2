//! Refinement stub: fixed text transforms over generated component source.
//!
//! The passes run in a fixed order and match on raw text, not on a parsed
//! representation. Their output is not checked for validity, and later passes
//! see whatever earlier passes produced. Running the accessibility pass twice
//! duplicates its attributes.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::models::Feature;

/// Sources longer than this (in characters) get a lazy-load wrapper when no
/// memoization applies.
pub const LAZY_LOAD_THRESHOLD: usize = 1000;

static BRAND_COLORS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"bg-blue-\d+", "bg-green-600"),
        (r"text-blue-\d+", "text-green-800"),
        (r"border-blue-\d+", "border-green-200"),
        (r"hover:bg-blue-\d+", "hover:bg-green-700"),
        (r"focus:ring-blue-\d+", "focus:ring-green-500"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

static STATE_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(const \[[^\]\n]*\] = useState[^;\n]*;)").unwrap());

static DEFAULT_EXPORT_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export default function (\w+)").unwrap());

static CLOSING_BRACE_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\}$").unwrap());

const PROPS_INTERFACE: &str = "
interface ComponentProps {
  className?: string;
  children?: React.ReactNode;
}

";

const ERROR_BOUNDARY_HEAD: &str = "
import { ErrorBoundary } from 'react-error-boundary';

function ErrorFallback({ error }: { error: Error }) {
  return (
    <div className=\"p-4 bg-red-50 border border-red-200 rounded-lg\">
      <h2 className=\"text-lg font-semibold text-red-800\">Something went wrong:</h2>
      <pre className=\"text-red-600 mt-2\">{error.message}</pre>
    </div>
  );
}

export default function WrappedComponent(props: any) {
  return (
    <ErrorBoundary FallbackComponent={ErrorFallback}>
      {/* Original component code */}
      ";

const ERROR_BOUNDARY_TAIL: &str = "
    </ErrorBoundary>
  );
}
";

const LOADING_STATE: &str = "
const [loading, setLoading] = useState(false);
const [error, setError] = useState<string | null>(null);

if (loading) {
  return (
    <div className=\"flex items-center justify-center p-8\">
      <div className=\"animate-spin rounded-full h-8 w-8 border-b-2 border-green-600\"></div>
      <span className=\"ml-2 text-green-600\">Loading...</span>
    </div>
  );
}

if (error) {
  return (
    <div className=\"p-4 bg-red-50 border border-red-200 rounded-lg\">
      <p className=\"text-red-600\">Error: {error}</p>
    </div>
  );
}
";

const LAZY_LOAD_WRAPPER: &str = "
import dynamic from 'next/dynamic';

export default dynamic(() => import('./Component'), {
  loading: () => <div className=\"animate-pulse bg-gray-200 h-32 rounded\"></div>,
  ssr: false
});
";

/// Data available to the refinement step. The passes do not consult it yet;
/// it is carried so callers can see what was loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefinementContext {
    pub features: Vec<Feature>,
    pub db_schema: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    BrandColors,
    PropsInterface,
    ErrorBoundary,
    LoadingStates,
    Accessibility,
    Performance,
}

impl Pass {
    /// Application order.
    pub const ALL: [Pass; 6] = [
        Self::BrandColors,
        Self::PropsInterface,
        Self::ErrorBoundary,
        Self::LoadingStates,
        Self::Accessibility,
        Self::Performance,
    ];

    pub fn apply(&self, code: &str) -> String {
        match self {
            Self::BrandColors => apply_brand_colors(code),
            Self::PropsInterface => add_props_interface(code),
            Self::ErrorBoundary => add_error_boundary(code),
            Self::LoadingStates => add_loading_states(code),
            Self::Accessibility => add_accessibility(code),
            Self::Performance => optimize_performance(code),
        }
    }
}

/// Refined source plus the passes that changed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refinement {
    pub code: String,
    pub changed: Vec<Pass>,
}

pub fn refine(code: &str, context: &RefinementContext) -> String {
    refine_with_report(code, context).code
}

pub fn refine_with_report(code: &str, context: &RefinementContext) -> Refinement {
    tracing::debug!(
        features = context.features.len(),
        db_schema = context.db_schema,
        "Refining component source"
    );

    let mut current = code.to_string();
    let mut changed = Vec::new();
    for pass in Pass::ALL {
        let next = pass.apply(&current);
        if next != current {
            changed.push(pass);
            current = next;
        }
    }

    Refinement {
        code: current,
        changed,
    }
}

fn apply_brand_colors(code: &str) -> String {
    BRAND_COLORS
        .iter()
        .fold(code.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

fn add_props_interface(code: &str) -> String {
    if !code.contains("interface") && code.contains("props") {
        format!("{PROPS_INTERFACE}{code}")
    } else {
        code.to_string()
    }
}

fn add_error_boundary(code: &str) -> String {
    if code.contains("ErrorBoundary") || !code.contains("export default") {
        return code.to_string();
    }

    let original = code.replacen("export default", "function OriginalComponent", 1);
    format!("{ERROR_BOUNDARY_HEAD}{original}{ERROR_BOUNDARY_TAIL}")
}

/// Declarations go right after the first `const [...] = useState(...);` line.
fn add_loading_states(code: &str) -> String {
    if !code.contains("useState") && !code.contains("useEffect") {
        return code.to_string();
    }

    STATE_DECLARATION
        .replacen(code, 1, |caps: &Captures| format!("{}\n{}", &caps[1], LOADING_STATE))
        .into_owned()
}

fn add_accessibility(code: &str) -> String {
    code.replace("<button", "<button aria-label=\"Button\"")
        .replace("<input", "<input aria-label=\"Input\"")
        .replace("<img", "<img alt=\"Image\"")
}

/// Memoize the default-exported function, closing the wrapper at the first
/// column-zero `}` after its declaration. Otherwise, oversized sources are
/// replaced by a lazy-load wrapper.
fn optimize_performance(code: &str) -> String {
    if !code.contains("React.memo") && code.contains("export default function") {
        if let Some(name) = DEFAULT_EXPORT_FUNCTION
            .captures(code)
            .map(|caps| caps[1].to_string())
        {
            let memoized = DEFAULT_EXPORT_FUNCTION
                .replace_all(code, "const ${1} = React.memo(function ${1}")
                .into_owned();
            let declaration = format!("const {name} = React.memo(function {name}");
            let search_from = memoized.find(&declaration).unwrap_or(0);

            return match CLOSING_BRACE_LINE.find_at(&memoized, search_from) {
                Some(brace) => format!(
                    "{}}});\n\nexport default {name};{}",
                    &memoized[..brace.start()],
                    &memoized[brace.end()..]
                ),
                None => memoized,
            };
        }
    }

    if code.chars().count() > LAZY_LOAD_THRESHOLD {
        return LAZY_LOAD_WRAPPER.to_string();
    }

    code.to_string()
}
