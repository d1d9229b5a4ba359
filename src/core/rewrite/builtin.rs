//! Built-in fixes for the logger migration breakage.
//!
//! Order matters: the ternary rules run from the most specific closing
//! sequence to the least, and the import rules run last so they see the
//! `console.*` calls already converted.

use super::pattern::{PatternDef, Scope};

const LEVELS: &str = "error|warn|info|debug";

/// Files that must keep calling `console` directly.
const CONSOLE_EXEMPT: &[&str] = &[
    "**/lib/logger.ts",
    "**/app/layout.tsx",
    "**/__tests__/runtime-errors.test.ts",
    "**/__tests__/unit/mutationObserver.test.ts",
    "**/lib/browser-fixes.ts",
];

const LOGGER_IMPORT: &str = "import { logger } from '@/lib/logger';";

const CANONICAL_TERNARY: &str = "${$var instanceof Error ? $var.message : String($var)}";

fn source_files() -> Scope {
    Scope::extensions(&["ts", "tsx"])
}

fn ternary(closing: &str) -> String {
    format!(
        r"\$\{{(?P<var>[\w.]+) instanceof Error \? (?P=var) : new Error\(String\((?P=var){}",
        closing
    )
}

fn calls_logger() -> String {
    format!(r"\blogger\.(?:{})\(", LEVELS)
}

/// A logger import on one line or spread over a `{ ... }` block.
fn imports_logger() -> &'static str {
    r#"(?m)^import(?:[^\n]*\blogger\b[^\n]*|\s*\{[^}]*\blogger\b[^}]*\})\s*from\s*['"][^'"]*logger['"]"#
}

/// Generic `error` ternary replaced with the name found in the window.
fn local_error_rule(id: &str, declaration: &str) -> PatternDef {
    PatternDef::new(
        id,
        &format!(
            r"(?P<head>{}(?:[^\n]*\n){{0,10}}?[^\n]*?)\berror instanceof Error \? error\.message : String\(error\)",
            declaration
        ),
        "${head}$var instanceof Error ? $var.message : String($var)",
    )
    .scoped(Scope::extensions(&["ts"]).including(&["**/app/api/**"]))
    .repeat()
}

pub fn definitions() -> Vec<PatternDef> {
    vec![
        PatternDef::new("logger-ternary-double-close", &ternary(r"\}\)\)\}"), CANONICAL_TERNARY)
            .describe("Error ternary closed as `String(x}))}`")
            .scoped(source_files()),
        PatternDef::new("logger-ternary-triple-close", &ternary(r"\}\)\)\)"), CANONICAL_TERNARY)
            .describe("Error ternary closed as `String(x})))`")
            .scoped(source_files()),
        PatternDef::new("logger-ternary-wrapped-in-error", &ternary(r"\)?\}"), CANONICAL_TERNARY)
            .describe("Error ternary that wraps the value in `new Error(...)` instead of reading `.message`")
            .scoped(source_files()),
        PatternDef::new(
            "performance-nested-template",
            r"logger\.debug\(`\[Performance\] \$\{name\}: \$\{value\}ms \$\{id \? `\(\$\{id\}\)` : ''\}\)\)",
            r#"logger.debug(`[Performance] $${name}: $${value}ms $${id ? `($${id})` : ""}`)"#,
        )
        .describe("Performance debug line with a broken nested template")
        .scoped(source_files()),
        PatternDef::new(
            "logger-template-double-close",
            &format!(
                r"(?m)^(?P<indent>[ \t]*)logger\.(?P<level>{})\(`(?P<body>[^`]*)`\)\);",
                LEVELS
            ),
            "${indent}logger.$level(`$body`);",
        )
        .describe("Logger statement with an extra closing paren")
        .scoped(source_files()),
        PatternDef::new(
            "logger-template-missing-backtick",
            &format!(
                r"logger\.(?P<level>{})\(`(?P<body>[^`]*)\$\{{(?P<expr>[^}}]*)\}}\)\)",
                LEVELS
            ),
            "logger.$level(`$body$${$expr}`)",
        )
        .describe("Logger template literal missing its closing backtick")
        .scoped(source_files()),
        PatternDef::new(
            "logger-split-interpolation",
            &format!(
                r"logger\.(?P<level>{})\(`(?P<msg>[^`$]*): \$\{{(?P<a>\w+), (?P<b>\w+)\}}`\)",
                LEVELS
            ),
            "logger.$level(`$msg: $${$a}, $${$b}`)",
        )
        .describe("Two values squeezed into one interpolation")
        .scoped(source_files()),
        PatternDef::new(
            "expect-logger-double-paren",
            &format!(
                r"expect\(logger\.(?P<level>{})\)\)\.toHaveBeenCalledWith\(",
                LEVELS
            ),
            "expect(logger.$level).toHaveBeenCalledWith(",
        )
        .describe("Test assertion with an extra paren after the logger method")
        .scoped(source_files()),
        local_error_rule(
            "destructured-error-variable",
            r"const\s*\{[^}]*\berror:\s*(?P<var>\w+)[^}]*\}",
        )
        .describe("Generic `error` used where the route destructured it under another name"),
        local_error_rule(
            "declared-error-variable",
            r"\bconst\s+(?P<var>\w+[Ee]rror\w*|error\w+)\s*=",
        )
        .describe("Generic `error` used where the route declared its own error variable"),
        PatternDef::new(
            "console-to-logger",
            &format!(r"\bconsole\.(?P<level>{})\(", LEVELS),
            "logger.$level(",
        )
        .describe("Direct console call that should go through the logger")
        .scoped(source_files().excluding(CONSOLE_EXEMPT)),
        PatternDef::new("console-log-to-logger-debug", r"\bconsole\.log\(", "logger.debug(")
            .describe("`console.log` mapped to `logger.debug`")
            .scoped(source_files().excluding(CONSOLE_EXEMPT)),
        PatternDef::new(
            "logger-import-after-imports",
            r#"\A(?P<head>(?s:.*)(?m:^)(?:import [^\n]*|\} from [^\n]*)['"];?[ \t]*(?P<cr>\r)?\n)"#,
            &format!("${{head}}{}${{cr}}\n", LOGGER_IMPORT),
        )
        .describe("Import the logger after the last import of a file that uses it")
        .scoped(source_files().excluding(&["**/lib/logger.ts"]))
        .only_if(&calls_logger())
        .skip_if(imports_logger()),
        PatternDef::new(
            "logger-import-prepend",
            r#"\A(?P<directive>(?:['"]use (?:client|server)['"];?[ \t]*\r?\n)?)(?P<line>[^\r\n]*(?P<cr>\r)?)"#,
            &format!("${{directive}}{}${{cr}}\n${{line}}", LOGGER_IMPORT),
        )
        .describe("Import the logger at the top of a file that uses it and has no imports")
        .scoped(source_files().excluding(&["**/lib/logger.ts"]))
        .only_if(&calls_logger())
        .skip_if(r"(?m)^import\s"),
    ]
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::rewrite::{engine, PatternCatalog};

    fn fix(path: &str, text: &str) -> String {
        let catalog = PatternCatalog::builtin().unwrap();
        engine::apply(text, &catalog.patterns_for(Path::new(path))).final_text
    }

    #[test]
    fn ternary_variants_reach_the_canonical_form() {
        let canonical = "${err instanceof Error ? err.message : String(err)}";
        for broken in [
            "${err instanceof Error ? err : new Error(String(err}))}",
            "${err instanceof Error ? err : new Error(String(err})))",
            "${err instanceof Error ? err : new Error(String(err)}",
            "${err instanceof Error ? err : new Error(String(err}",
        ] {
            let line = format!("logger.warn(`x {}`);\n", broken);
            let out = fix("src/a.ts", &format!("import {{ logger }} from '@/lib/logger';\n{}", line));
            assert!(out.contains(canonical), "{} -> {}", broken, out);
        }
    }

    #[test]
    fn mismatched_ternary_variables_are_left_alone() {
        let text = "import { logger } from '@/lib/logger';\nlogger.error(`${a instanceof Error ? b : new Error(String(a)}`);\n";
        assert_eq!(fix("src/a.ts", text), text);
    }

    #[test]
    fn performance_line() {
        let text = "logger.debug(`[Performance] ${name}: ${value}ms ${id ? `(${id})` : ''}))";
        let out = fix("src/hooks/usePerformance.ts", &format!("import {{ logger }} from './logger';\n{}", text));
        assert!(out.ends_with("logger.debug(`[Performance] ${name}: ${value}ms ${id ? `(${id})` : \"\"}`)"));
    }

    #[test]
    fn template_double_close_keeps_indent() {
        let out = fix(
            "src/a.ts",
            "import { logger } from '@/lib/logger';\n    logger.info(`Loaded ${count} items`));\n",
        );
        assert!(out.ends_with("    logger.info(`Loaded ${count} items`);\n"));
    }

    #[test]
    fn missing_backtick_is_restored() {
        let out = fix(
            "src/a.ts",
            "import { logger } from '@/lib/logger';\nlogger.error(`Fetch failed for ${url}))\n",
        );
        assert!(out.ends_with("logger.error(`Fetch failed for ${url}`)\n"));
    }

    #[test]
    fn split_interpolation() {
        let out = fix(
            "src/components/ErrorBoundary.tsx",
            "import { logger } from '@/lib/logger';\nlogger.error(`ErrorBoundary caught an error: ${error, errorInfo}`);\n",
        );
        assert!(out.contains("`ErrorBoundary caught an error: ${error}, ${errorInfo}`"));
    }

    #[test]
    fn expect_double_paren() {
        let out = fix(
            "src/__tests__/a.test.ts",
            "import { logger } from '@/lib/logger';\nexpect(logger.warn)).toHaveBeenCalledWith(`x`);\n",
        );
        assert!(out.contains("expect(logger.warn).toHaveBeenCalledWith(`x`);"));
    }

    #[test]
    fn destructured_error_uses_the_local_name() {
        let text = "\
const { data, error: fetchError } = await supabase.from('words').select();
if (fetchError) {
  return NextResponse.json({ error: error instanceof Error ? error.message : String(error) });
}
";
        let out = fix("src/app/api/words/route.ts", text);
        assert!(out.contains("fetchError instanceof Error ? fetchError.message : String(fetchError)"));

        // Outside API routes the rule does not apply.
        assert_eq!(fix("src/lib/words.ts", text), text);
    }

    #[test]
    fn every_ternary_in_the_window_is_fixed_in_one_pass() {
        let text = "\
const { data, error: fetchError } = await load();
if (fetchError) {
  const message = error instanceof Error ? error.message : String(error);
  return NextResponse.json({ error: error instanceof Error ? error.message : String(error) });
}
";
        let catalog = PatternCatalog::builtin().unwrap();
        let patterns = catalog.patterns_for(Path::new("src/app/api/words/route.ts"));

        let first = engine::apply(text, &patterns);
        assert_eq!(first.occurrences_of("destructured-error-variable"), 2);
        assert!(!first.final_text.contains("error instanceof"));

        let second = engine::apply(&first.final_text, &patterns);
        assert!(!second.changed);
        assert_eq!(second.total_occurrences(), 0);
    }

    #[test]
    fn declared_error_name_is_used() {
        let text = "\
const saveError = await save(words);
if (saveError) {
  return NextResponse.json({ error: error instanceof Error ? error.message : String(error) });
}
";
        let out = fix("src/app/api/save/route.ts", text);
        assert!(out.contains("saveError instanceof Error ? saveError.message : String(saveError)"));

        // A plain `const error` names nothing new.
        let plain = text.replace("saveError", "error");
        assert_eq!(fix("src/app/api/save/route.ts", &plain), plain);
    }

    #[test]
    fn destructured_error_window_is_ten_lines() {
        let far = format!(
            "const {{ error: e }} = x;\n{}y = error instanceof Error ? error.message : String(error);\n",
            "z;\n".repeat(12)
        );
        assert_eq!(fix("src/app/api/r/route.ts", &far), far);
    }

    #[test]
    fn console_calls_become_logger_calls_with_import() {
        let text = "import React from 'react';\nimport { useState } from 'react';\n\nconsole.error('a');\nconsole.log('b');\n";
        let out = fix("src/components/A.tsx", text);
        assert_eq!(
            out,
            "import React from 'react';\nimport { useState } from 'react';\nimport { logger } from '@/lib/logger';\n\nlogger.error('a');\nlogger.debug('b');\n"
        );
    }

    #[test]
    fn multi_line_import_block_is_respected() {
        let text = "import {\n  a,\n  b,\n} from './x';\n\nconsole.warn(a);\n";
        let out = fix("src/a.ts", text);
        assert_eq!(
            out,
            "import {\n  a,\n  b,\n} from './x';\nimport { logger } from '@/lib/logger';\n\nlogger.warn(a);\n"
        );
    }

    #[test]
    fn import_is_prepended_after_directive() {
        let out = fix("src/app/page.tsx", "'use client';\nconsole.info('x');\n");
        assert_eq!(
            out,
            "'use client';\nimport { logger } from '@/lib/logger';\nlogger.info('x');\n"
        );

        let out = fix("src/util.ts", "console.debug(1);\n");
        assert_eq!(out, "import { logger } from '@/lib/logger';\nlogger.debug(1);\n");
    }

    #[test]
    fn crlf_files_get_a_crlf_import() {
        let text = "'use client';\r\nimport React from 'react';\r\n\r\nconsole.error('a');\r\n";
        assert_eq!(
            fix("src/app/page.tsx", text),
            "'use client';\r\nimport React from 'react';\r\nimport { logger } from '@/lib/logger';\r\n\r\nlogger.error('a');\r\n"
        );

        let text = "'use client';\r\nconsole.error('a');\r\n";
        assert_eq!(
            fix("src/app/page.tsx", text),
            "'use client';\r\nimport { logger } from '@/lib/logger';\r\nlogger.error('a');\r\n"
        );

        assert_eq!(
            fix("src/util.ts", "console.warn(1);\r\n"),
            "import { logger } from '@/lib/logger';\r\nlogger.warn(1);\r\n"
        );
    }

    #[test]
    fn import_is_prepended_to_single_line_file() {
        assert_eq!(
            fix("src/util.ts", "console.warn(1);"),
            "import { logger } from '@/lib/logger';\nlogger.warn(1);"
        );
    }

    #[test]
    fn multi_line_logger_import_is_recognized() {
        let text = "import {\n  api,\n  logger,\n} from '@/lib/logger';\n\nconsole.warn(a);\n";
        assert_eq!(
            fix("src/a.ts", text),
            "import {\n  api,\n  logger,\n} from '@/lib/logger';\n\nlogger.warn(a);\n"
        );
    }

    #[test]
    fn exempt_files_keep_console() {
        let text = "console.error('boot');\n";
        assert_eq!(fix("src/lib/logger.ts", text), text);
        assert_eq!(fix("src/app/layout.tsx", text), text);
        assert_eq!(fix("src/lib/browser-fixes.ts", text), text);
    }

    #[test]
    fn existing_logger_import_is_not_duplicated() {
        let text = "import { logger } from '@/lib/logger';\nconsole.warn('x');\n";
        assert_eq!(
            fix("src/a.ts", text),
            "import { logger } from '@/lib/logger';\nlogger.warn('x');\n"
        );
    }
}
