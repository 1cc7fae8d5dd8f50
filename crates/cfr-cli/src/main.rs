use std::ffi::OsString;
use std::io::{self, Write};

use cfr::{
    CfrError, CfrTree, DefaultValue, Diagnostic, Guid, HobList, MemoryStore, MenuConfig,
    MenuContext, MenuElement, Severity, WalkConfig, WalkReport, Walker, build_menu,
    find_default_with,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    files: Vec<String>,
    config_path: Option<String>,
    hob_guid: Option<Guid>,
    json: bool,
    form: Option<String>,
    default: Option<String>,
    show_help: bool,
}

/// `--config` file contents; every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    walk: WalkConfig,
    menu: MenuConfig,
}

#[derive(Debug, Serialize)]
struct MenuOutput<'m> {
    elements: &'m [MenuElement],
    provisioned: &'m [String],
    storage_errors: Vec<String>,
    report: &'m WalkReport,
}

fn main() {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let exit_code = run(std::env::args_os(), &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run<I, W, E>(args: I, out: &mut W, err: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            let _ = writeln!(err, "error: {message}");
            let _ = write_usage(err);
            return 2;
        }
    };

    if options.show_help {
        if write_usage(out).is_err() {
            return 1;
        }
        return 0;
    }

    let config = match options.config_path.as_deref().map(load_config) {
        Some(Ok(config)) => config,
        Some(Err(failure)) => return failure.report(err),
        None => CliConfig::default(),
    };

    let mut buffers = Vec::with_capacity(options.files.len());
    for path in &options.files {
        match std::fs::read(path) {
            Ok(bytes) => buffers.push(bytes),
            Err(error) => {
                return Failure::new(format!("failed reading `{path}`"), error).report(err);
            }
        }
    }

    let trees = match load_trees(&options, &buffers) {
        Ok(trees) => trees,
        Err(failure) => return failure.report(err),
    };

    match options.default.as_deref() {
        Some(option) => run_default(&trees, &config, options.form.as_deref(), option, out, err),
        None => run_menu(&trees, &config, options.json, out, err),
    }
}

/// A fatal error with the context it happened in.
struct Failure {
    context: String,
    error: CfrError,
}

impl Failure {
    fn new(context: String, error: impl Into<CfrError>) -> Self {
        Self {
            context,
            error: error.into(),
        }
    }

    fn report<E: Write>(&self, err: &mut E) -> i32 {
        let _ = writeln!(err, "error: {}: {}", self.context, self.error);
        self.error.exit_code()
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut options = CliOptions {
        files: Vec::new(),
        config_path: None,
        hob_guid: None,
        json: false,
        form: None,
        default: None,
        show_help: false,
    };

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy();
        let arg_str = arg.as_ref();

        let (flag, inline) = match arg_str.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_owned())),
            _ => (arg_str, None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => iter
                    .next()
                    .map(|next| next.to_string_lossy().into_owned())
                    .ok_or_else(|| format!("missing argument for `{name}`")),
            }
        };

        match flag {
            "-h" | "--help" => options.show_help = true,
            "--json" => options.json = true,
            "--config" => set_once(&mut options.config_path, value("--config")?, "--config")?,
            "--form" => set_once(&mut options.form, value("--form")?, "--form")?,
            "--default" => set_once(&mut options.default, value("--default")?, "--default")?,
            "--hob-guid" => {
                if options.hob_guid.is_some() {
                    return Err(String::from("`--hob-guid` may only be provided once"));
                }
                let text = value("--hob-guid")?;
                let guid = text
                    .parse::<Guid>()
                    .map_err(|_| format!("invalid GUID for `--hob-guid`: `{text}`"))?;
                options.hob_guid = Some(guid);
            }
            _ if arg_str.starts_with('-') => {
                return Err(format!("unknown option `{arg_str}`"));
            }
            _ => options.files.push(arg_str.to_owned()),
        }
    }

    if options.show_help {
        return Ok(options);
    }
    if options.files.is_empty() {
        return Err(String::from("expected at least one FILE"));
    }
    if options.form.is_some() && options.default.is_none() {
        return Err(String::from("`--form` requires `--default`"));
    }
    if options.json && options.default.is_some() {
        return Err(String::from("`--json` cannot be combined with `--default`"));
    }

    Ok(options)
}

fn set_once(slot: &mut Option<String>, value: String, flag: &str) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("`{flag}` may only be provided once"));
    }
    *slot = Some(value);
    Ok(())
}

fn load_config(path: &str) -> Result<CliConfig, Failure> {
    let contents = std::fs::read_to_string(path)
        .map_err(|error| Failure::new(format!("failed reading config `{path}`"), error))?;
    serde_json::from_str(&contents).map_err(|error| {
        let error = CfrError::config_request(error.to_string());
        Failure::new(format!("invalid config JSON `{path}`"), error)
    })
}

fn load_trees<'a>(options: &CliOptions, buffers: &'a [Vec<u8>]) -> Result<Vec<CfrTree<'a>>, Failure> {
    let mut trees = Vec::new();
    for (path, buffer) in options.files.iter().zip(buffers) {
        match options.hob_guid {
            Some(guid) => {
                let found = CfrTree::from_hob_list(&HobList::new(buffer), guid);
                if found.is_empty() {
                    let error = CfrError::HobNotFound {
                        guid: guid.to_string(),
                    };
                    return Err(Failure::new(format!("scanning `{path}`"), error));
                }
                trees.extend(found);
            }
            None => {
                let tree = CfrTree::new(buffer)
                    .map_err(|error| Failure::new(format!("`{path}` is not a CFR tree"), error))?;
                trees.push(tree);
            }
        }
    }
    Ok(trees)
}

fn run_menu<W, E>(trees: &[CfrTree<'_>], config: &CliConfig, json: bool, out: &mut W, err: &mut E) -> i32
where
    W: Write,
    E: Write,
{
    let store = MemoryStore::new();
    let ctx = MenuContext::new(&store, &config.menu).with_policy(&store);
    let menu = build_menu(ctx, &Walker::new(config.walk), trees);

    let written = if json {
        let output = MenuOutput {
            elements: &menu.elements,
            provisioned: &menu.provisioned,
            storage_errors: menu.storage_errors.iter().map(ToString::to_string).collect(),
            report: &menu.report,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(rendered) => writeln!(out, "{rendered}"),
            Err(error) => {
                let _ = writeln!(err, "error: failed serializing menu: {error}");
                return 1;
            }
        }
    } else {
        menu.elements
            .iter()
            .try_for_each(|element| writeln!(out, "{element}"))
    };
    if written.is_err() {
        let _ = writeln!(err, "error: failed writing menu");
        return 1;
    }

    for diagnostic in &menu.report.diagnostics {
        let _ = writeln!(err, "{}", format_diagnostic(diagnostic));
    }
    for error in &menu.storage_errors {
        let _ = writeln!(err, "error: {error}");
    }

    i32::from(!menu.is_clean())
}

fn run_default<W, E>(
    trees: &[CfrTree<'_>],
    config: &CliConfig,
    form: Option<&str>,
    option: &str,
    out: &mut W,
    err: &mut E,
) -> i32
where
    W: Write,
    E: Write,
{
    match find_default_with(&config.walk, trees, form, option) {
        Ok(value) => {
            if writeln!(out, "{}", format_default(&value)).is_err() {
                let _ = writeln!(err, "error: failed writing default");
                return 1;
            }
            0
        }
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            error.exit_code()
        }
    }
}

fn format_default(value: &DefaultValue<'_>) -> String {
    if let Some(number) = value.as_u32() {
        return number.to_string();
    }
    if let Some(text) = value.as_text() {
        return text.to_owned();
    }
    value.bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    format!(
        "{severity}: tree {} offset {:#x} tag {:#06x}: {}",
        diagnostic.tree, diagnostic.offset, diagnostic.tag, diagnostic.error
    )
}

fn write_usage<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Usage: cfr [OPTIONS] FILE...\n\
         \n\
         Each FILE is one CFR form tree, or with --hob-guid a HOB list.\n\
         \n\
         Options:\n\
         \x20 --config FILE     JSON overrides with optional \"walk\" and \"menu\" sections\n\
         \x20 --hob-guid GUID   Scan FILEs as HOB lists for GUID extension HOBs\n\
         \x20 --json            Print the menu as JSON\n\
         \x20 --default OPTION  Print the default of OPTION instead of the menu\n\
         \x20 --form NAME       Restrict --default to trees whose root form is NAME\n\
         \x20 -h, --help        Show this help"
    )
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::fs;
    use std::path::Path;

    use cfr::cfr_types::hob::{encode_end_of_list, encode_guid_hob};
    use cfr::{CfrBuilder, OptionBuilder, OptionFlags};
    use serde_json::Value;

    use super::{parse_args, run};

    const GUID_TEXT: &str = "b3a5f0c2-6e1d-4c8b-9f27-0d4e8a1c5b63";

    fn parse_from(args: &[&str]) -> Result<super::CliOptions, String> {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        parse_args(os_args)
    }

    fn run_with(args: &[&str]) -> (i32, String, String) {
        let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(os_args, &mut out, &mut err);
        (
            code,
            String::from_utf8(out).expect("stdout is UTF-8"),
            String::from_utf8(err).expect("stderr is UTF-8"),
        )
    }

    fn main_tree() -> Vec<u8> {
        CfrBuilder::form("Main")
            .option(
                OptionBuilder::enumeration("Mode", "Boot mode", 1)
                    .object_id(2)
                    .flags(OptionFlags::READONLY)
                    .value(0, "Off")
                    .value(1, "On"),
            )
            .option(OptionBuilder::varchar("Owner", "Owner tag", "lab").object_id(3))
            .build()
    }

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> String {
        let path = dir.join(name);
        fs::write(&path, bytes).expect("write fixture");
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn parse_args_accepts_inline_values() {
        let options = parse_from(&["cfr", "--default=Mode", "--form", "Main", "a.bin"])
            .expect("valid arguments");
        assert_eq!(options.default.as_deref(), Some("Mode"));
        assert_eq!(options.form.as_deref(), Some("Main"));
        assert_eq!(options.files, ["a.bin"]);
    }

    #[test]
    fn parse_args_rejects_bad_combinations() {
        assert!(parse_from(&["cfr"]).is_err());
        assert!(parse_from(&["cfr", "--form", "Main", "a.bin"]).is_err());
        assert!(parse_from(&["cfr", "--json", "--default", "X", "a.bin"]).is_err());
        assert!(parse_from(&["cfr", "--hob-guid", "not-a-guid", "a.bin"]).is_err());
        assert!(parse_from(&["cfr", "--config", "a.json", "--config", "b.json", "a.bin"]).is_err());
        assert!(parse_from(&["cfr", "--bogus", "a.bin"]).is_err());
        assert!(parse_from(&["cfr", "--help"]).expect("help").show_help);
    }

    #[test]
    fn usage_error_exits_2() {
        let (code, out, err) = run_with(&["cfr", "--nope"]);
        assert_eq!(code, 2);
        assert!(out.is_empty());
        assert!(err.contains("unknown option `--nope`"));
        assert!(err.contains("Usage: cfr"));
    }

    #[test]
    fn dumps_menu_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "main.cfr", &main_tree());

        let (code, out, err) = run_with(&["cfr", &path]);
        assert_eq!(code, 0, "stderr: {err}");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Boot mode"));
        assert!(lines[1].contains("read-only"));
        assert!(lines[2].contains("Owner tag"));
        assert!(err.is_empty());
    }

    #[test]
    fn dumps_menu_json_with_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "main.cfr", &main_tree());
        let config = write(
            dir.path(),
            "config.json",
            br#"{ "menu": { "tree_separator": false } }"#,
        );

        let (code, out, _) = run_with(&["cfr", "--json", "--config", &config, &path]);
        assert_eq!(code, 0);
        let parsed: Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(parsed["elements"].as_array().expect("elements").len(), 3);
        assert_eq!(parsed["elements"][1]["type"], "one_of");
        assert_eq!(parsed["provisioned"], serde_json::json!(["Mode", "Owner"]));
        assert_eq!(parsed["report"]["options"], 2);
    }

    #[test]
    fn diagnostics_exit_1() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blob = CfrBuilder::form("Main")
            .option(OptionBuilder::varchar("Big", "Big", &"x".repeat(400)))
            .option(OptionBuilder::number("Kept", "Kept", 5).object_id(1))
            .build();
        let path = write(dir.path(), "bad.cfr", &blob);

        let (code, out, err) = run_with(&["cfr", &path]);
        assert_eq!(code, 1);
        assert!(out.contains("Kept"));
        assert!(err.starts_with("error: tree 0 offset"));
    }

    #[test]
    fn config_can_raise_string_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blob = CfrBuilder::form("Main")
            .option(OptionBuilder::varchar("Big", "Big", &"x".repeat(400)).object_id(1))
            .build();
        let path = write(dir.path(), "big.cfr", &blob);
        let config = write(
            dir.path(),
            "config.json",
            br#"{ "walk": { "max_default_len": 1024 } }"#,
        );

        let (code, _, err) = run_with(&["cfr", "--config", &config, &path]);
        assert_eq!(code, 0, "stderr: {err}");
    }

    #[test]
    fn resolves_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "main.cfr", &main_tree());

        let (code, out, _) = run_with(&["cfr", "--default", "Mode", &path]);
        assert_eq!((code, out.as_str()), (0, "1\n"));

        let (code, out, _) = run_with(&["cfr", "--form", "Main", "--default", "Owner", &path]);
        assert_eq!((code, out.as_str()), (0, "lab\n"));

        let (code, out, err) = run_with(&["cfr", "--default", "Main", &path]);
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert!(err.contains("Main"));

        let (code, _, err) = run_with(&["cfr", "--form", "Other", "--default", "Mode", &path]);
        assert_eq!(code, 1);
        assert!(err.starts_with("error:"));
    }

    #[test]
    fn scans_hob_lists() {
        let guid = GUID_TEXT.parse().expect("valid GUID");
        let mut list = encode_guid_hob(guid, &main_tree()).expect("fits");
        list.extend(encode_end_of_list());

        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "hobs.bin", &list);

        let (code, out, _) = run_with(&["cfr", "--hob-guid", GUID_TEXT, "--default", "Owner", &path]);
        assert_eq!((code, out.as_str()), (0, "lab\n"));

        let other = "00000000-0000-0000-0000-000000000001";
        let (code, _, err) = run_with(&["cfr", "--hob-guid", other, &path]);
        assert_eq!(code, 1);
        assert!(err.contains("no CFR HOB"));
    }

    #[test]
    fn config_depth_limit_applies_to_defaults() {
        let leaf = CfrBuilder::form("Leaf").option(OptionBuilder::number("Deep", "Deep", 9));
        let blob = (0..34)
            .fold(leaf, |inner, level| CfrBuilder::form(&format!("L{level}")).subform(inner))
            .build();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "deep.cfr", &blob);

        let (code, out, err) = run_with(&["cfr", "--default", "Deep", &path]);
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert!(err.contains("nests deeper than 32 levels"));

        let config = write(dir.path(), "config.json", br#"{ "walk": { "max_depth": 40 } }"#);
        let (code, out, err) = run_with(&["cfr", "--config", &config, "--default", "Deep", &path]);
        assert_eq!((code, out.as_str()), (0, "9\n"), "stderr: {err}");
    }

    #[test]
    fn unreadable_files_exit_3() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing.cfr");
        let missing = missing.to_string_lossy().into_owned();

        let (code, out, err) = run_with(&["cfr", &missing]);
        assert_eq!(code, 3);
        assert!(out.is_empty());
        assert!(err.starts_with("error: failed reading `"));
        assert!(err.contains("I/O error"));

        let path = write(dir.path(), "main.cfr", &main_tree());
        let (code, _, err) = run_with(&["cfr", "--config", &missing, &path]);
        assert_eq!(code, 3);
        assert!(err.contains("failed reading config"));
    }

    #[test]
    fn malformed_config_exits_1() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "main.cfr", &main_tree());
        let config = write(dir.path(), "config.json", b"{ not json");

        let (code, out, err) = run_with(&["cfr", "--config", &config, &path]);
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert!(err.contains("invalid config JSON"));
    }

    #[test]
    fn rejects_non_tree_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "junk.bin", b"junk");

        let (code, _, err) = run_with(&["cfr", &path]);
        assert_eq!(code, 1);
        assert!(err.contains("is not a CFR tree"));
    }
}
