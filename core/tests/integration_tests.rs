use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;

use interactive_command_core::{
    Command, CommandError, CommandPlugin, Outcome, OptionSpec, Prompt, ResolveContext, Resolver,
    Result, ValidateFn, Value, ValueSource, partial_parse,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Scripted answer for one prompt, consumed in order.
enum Answer {
    Confirm(bool),
    Select(String),
    Input(String),
}

/// Terminal stand-in: pops scripted answers and records every prompt shown,
/// so tests can assert both what was asked and in what order.
#[derive(Default)]
struct ScriptedPrompt {
    answers: Mutex<VecDeque<Answer>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    fn scripted(answers: Vec<Answer>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            log: Mutex::new(Vec::new()),
        })
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn pop(&self) -> Result<Answer> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CommandError::Prompt("unexpected prompt: script exhausted".into()))
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        self.log
            .lock()
            .unwrap()
            .push(format!("confirm:{message}:{default}"));
        match self.pop()? {
            Answer::Confirm(answer) => Ok(answer),
            _ => Err(CommandError::Prompt("expected a confirm answer".into())),
        }
    }

    async fn select(&self, message: &str, choices: &[String]) -> Result<String> {
        self.log
            .lock()
            .unwrap()
            .push(format!("select:{message}:{}", choices.join(",")));
        match self.pop()? {
            Answer::Select(answer) => Ok(answer),
            _ => Err(CommandError::Prompt("expected a select answer".into())),
        }
    }

    async fn input(
        &self,
        message: &str,
        default: Option<String>,
        validate: ValidateFn,
    ) -> Result<String> {
        self.log
            .lock()
            .unwrap()
            .push(format!("input:{message}:{}", default.unwrap_or_default()));
        match self.pop()? {
            Answer::Input(answer) => {
                validate(&answer).map_err(CommandError::Prompt)?;
                Ok(answer)
            }
            _ => Err(CommandError::Prompt("expected an input answer".into())),
        }
    }
}

type Seen = Arc<Mutex<BTreeMap<String, Value>>>;

/// Attaches an action that records the target node's resolved values.
fn capture() -> (Seen, impl Fn(Command) -> Command) {
    let seen: Seen = Arc::new(Mutex::new(BTreeMap::new()));
    let sink = seen.clone();
    let attach = move |command: Command| {
        let sink = sink.clone();
        command.with_action(move |ctx| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = ctx.values().clone();
                Ok(())
            }
        })
    };
    (seen, attach)
}

fn sandwich_command() -> (Seen, Command) {
    let (seen, attach) = capture();
    let sandwich = attach(
        Command::new("sandwich")
            .with_option(OptionSpec::new("-c, --cheese", "Add cheese"))
            .with_option(
                OptionSpec::new("-s, --size <size>", "Sandwich size")
                    .with_choices(["small", "medium", "large"])
                    .with_default("medium"),
            ),
    );
    (seen, sandwich)
}

fn argv<const N: usize>(tokens: [&str; N]) -> Vec<String> {
    tokens.into_iter().map(String::from).collect()
}

// ---------------------------------------------------------------------------
// Tolerant pre-parse
// ---------------------------------------------------------------------------

#[test]
fn test_partial_parse_classifies_by_provenance() {
    let program = Command::new("order").with_subcommand(
        Command::new("sandwich")
            .with_option(OptionSpec::new("-c, --cheese", "Add cheese"))
            .with_option(OptionSpec::new("-s, --size <size>", "Sandwich size").required())
            .with_option(OptionSpec::new("-d, --drink <drink>", "Drink").with_default("water")),
    );

    let tables = partial_parse(&program, &argv(["sandwich", "--cheese"])).unwrap();
    let path = vec![0usize];

    let provided = tables.provided(&path).unwrap();
    assert_eq!(provided.get("cheese"), Some(&Value::Bool(true)));
    assert_eq!(provided.get("drink"), Some(&Value::Str("water".into())));
    assert!(!provided.contains_key("size"));

    assert_eq!(tables.source(&path, "cheese"), Some(ValueSource::Cli));
    assert_eq!(tables.source(&path, "drink"), Some(ValueSource::Default));
    assert_eq!(tables.source(&path, "size"), None);

    let missing = tables.missing(&path).unwrap();
    assert!(missing.contains("size"));
    assert_eq!(missing.len(), 1);
}

#[test]
fn test_partial_parse_rejects_unknown_options() {
    let program =
        Command::new("order").with_subcommand(Command::new("sandwich"));
    let error = partial_parse(&program, &argv(["sandwich", "--bogus"])).unwrap_err();
    assert!(matches!(error, CommandError::UnknownOption(token) if token == "--bogus"));
}

#[test]
fn test_partial_parse_does_not_touch_live_state() {
    let program = Command::new("order").with_subcommand(
        Command::new("sandwich")
            .with_option(OptionSpec::new("-s, --size <size>", "Sandwich size").with_default("medium")),
    );
    partial_parse(&program, &argv(["sandwich", "--size", "large"])).unwrap();
    assert_eq!(program.find_subcommand("sandwich").unwrap().get_value("size"), None);
}

// ---------------------------------------------------------------------------
// Strict parsing and routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cli_values_reach_the_action() {
    let (seen, sandwich) = sandwich_command();
    let mut program = Command::new("order").with_subcommand(sandwich);

    let outcome = program
        .invoke(argv(["order", "sandwich", "--cheese", "--size", "large"]))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Ran);
    let values = seen.lock().unwrap().clone();
    assert_eq!(values.get("cheese"), Some(&Value::Bool(true)));
    assert_eq!(values.get("size"), Some(&Value::Str("large".into())));
}

#[tokio::test]
async fn test_inline_value_and_choice_validation() {
    let (seen, sandwich) = sandwich_command();
    let mut program = Command::new("order").with_subcommand(sandwich);

    program
        .invoke(argv(["order", "sandwich", "--size=small"]))
        .await
        .unwrap();
    assert_eq!(
        seen.lock().unwrap().get("size"),
        Some(&Value::Str("small".into()))
    );

    let error = program
        .invoke(argv(["order", "sandwich", "--size", "tiny"]))
        .await
        .unwrap_err();
    assert!(matches!(error, CommandError::InvalidArgument { .. }));
}

#[tokio::test]
async fn test_boolean_flag_rejects_inline_value() {
    let (_seen, sandwich) = sandwich_command();
    let mut program = Command::new("order").with_subcommand(sandwich);
    let error = program
        .invoke(argv(["order", "sandwich", "--cheese=yes"]))
        .await
        .unwrap_err();
    assert!(matches!(error, CommandError::InvalidArgument { .. }));
}

#[tokio::test]
async fn test_operands_pass_through_with_terminator() {
    let operands: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = operands.clone();
    let hello = Command::new("hello").with_action(move |ctx| {
        let sink = sink.clone();
        async move {
            *sink.lock().unwrap() = ctx.operands().to_vec();
            Ok(())
        }
    });
    let mut program = Command::new("order").with_subcommand(hello);

    program
        .invoke(argv(["order", "hello", "sesame", "--", "-x"]))
        .await
        .unwrap();
    assert_eq!(*operands.lock().unwrap(), vec!["sesame", "-x"]);
}

#[tokio::test]
async fn test_default_subcommand_receives_unmatched_flags() {
    let (seen, attach) = capture();
    let hello = attach(
        Command::new("hello")
            .with_option(OptionSpec::new("-n, --name <name>", "Name").with_default("world")),
    );

    let mut program = Command::new("greeter").with_default_subcommand(hello);

    let outcome = program
        .invoke(argv(["greeter", "--name", "Alice"]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Ran);
    assert_eq!(
        seen.lock().unwrap().get("name"),
        Some(&Value::Str("Alice".into()))
    );
}

#[tokio::test]
async fn test_unknown_subcommand_fails() {
    let mut program = Command::new("order").with_subcommand(Command::new("sandwich"));
    let error = program.invoke(argv(["order", "pizza"])).await.unwrap_err();
    assert!(matches!(error, CommandError::UnknownCommand(name) if name == "pizza"));
}

#[tokio::test]
async fn test_missing_required_fails_without_interactive_mode() {
    let (_seen, attach) = capture();
    let deploy = attach(
        Command::new("deploy")
            .with_option(OptionSpec::new("-r, --region <region>", "Region").required()),
    );
    let mut program = Command::new("ops").with_subcommand(deploy);

    let error = program.invoke(argv(["ops", "deploy"])).await.unwrap_err();
    assert!(
        matches!(error, CommandError::MissingMandatoryOption(flags) if flags == "-r, --region <region>")
    );
}

#[tokio::test]
async fn test_version_flag_short_circuits() {
    let (_seen, attach) = capture();
    let deploy = attach(
        Command::new("deploy")
            .with_option(OptionSpec::new("-r, --region <region>", "Region").required()),
    );

    let prompt = ScriptedPrompt::scripted(Vec::new());
    let mut program = Command::new("ops")
        .with_version("3.1.0")
        .with_subcommand(deploy)
        .with_prompter(prompt.clone())
        .interactive();

    let outcome = program.invoke(argv(["ops", "--version"])).await.unwrap();
    assert_eq!(outcome, Outcome::VersionDisplayed);
    assert!(prompt.log().is_empty());
}

#[tokio::test]
async fn test_help_flag_short_circuits() {
    let prompt = ScriptedPrompt::scripted(Vec::new());
    let mut program = Command::new("order")
        .with_subcommand(
            Command::new("sandwich")
                .with_option(OptionSpec::new("-s, --size <size>", "Sandwich size").required()),
        )
        .with_prompter(prompt.clone())
        .interactive();

    let outcome = program
        .invoke(argv(["order", "sandwich", "--help"]))
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::HelpDisplayed);
    assert!(prompt.log().is_empty());
}

#[test]
fn test_sync_parse_is_rejected() {
    let mut program = Command::new("order");
    let error = program.parse(argv(["order"])).unwrap_err();
    assert!(matches!(error, CommandError::SyncParseUnsupported));
}

// ---------------------------------------------------------------------------
// Interactive resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cli_supplied_options_never_prompt() {
    let (seen, sandwich) = sandwich_command();
    let prompt = ScriptedPrompt::scripted(vec![Answer::Select("large".into())]);
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive();

    program
        .invoke(argv(["order", "sandwich", "--cheese", "--interactive"]))
        .await
        .unwrap();

    // Only the size prompt fired; cheese came from the command line.
    let log = prompt.log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0], "select:Sandwich size:medium,small,large");

    let values = seen.lock().unwrap().clone();
    assert_eq!(values.get("cheese"), Some(&Value::Bool(true)));
    assert_eq!(values.get("size"), Some(&Value::Str("large".into())));
}

#[tokio::test]
async fn test_fully_supplied_argv_never_prompts_and_matches_plain_parse() {
    let args = argv(["order", "sandwich", "--cheese", "--size", "large"]);

    let (plain_seen, plain_sandwich) = sandwich_command();
    let mut plain = Command::new("order").with_subcommand(plain_sandwich);
    plain.invoke(args.clone()).await.unwrap();

    let (seen, sandwich) = sandwich_command();
    let prompt = ScriptedPrompt::scripted(Vec::new());
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive();
    let mut args_interactive = args;
    args_interactive.push("-i".into());
    program.invoke(args_interactive).await.unwrap();

    assert!(prompt.log().is_empty());
    let plain_values = plain_seen.lock().unwrap().clone();
    let values = seen.lock().unwrap().clone();
    assert_eq!(values.get("cheese"), plain_values.get("cheese"));
    assert_eq!(values.get("size"), plain_values.get("size"));
}

#[tokio::test]
async fn test_boolean_option_confirms_with_default() {
    let (seen, sandwich) = sandwich_command();
    let prompt = ScriptedPrompt::scripted(vec![
        Answer::Confirm(true),
        Answer::Select("small".into()),
    ]);
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive();

    program
        .invoke(argv(["order", "sandwich", "-i"]))
        .await
        .unwrap();

    // Declaration order: cheese first (no value yet, default false), then size.
    let log = prompt.log();
    assert_eq!(log[0], "confirm:Add cheese:false");
    assert_eq!(log[1], "select:Sandwich size:medium,small,large");

    let values = seen.lock().unwrap().clone();
    assert_eq!(values.get("cheese"), Some(&Value::Bool(true)));
    assert_eq!(values.get("size"), Some(&Value::Str("small".into())));
}

#[tokio::test]
async fn test_negated_flag_inverts_confirmation() {
    let (seen, attach) = capture();
    let sandwich = attach(
        Command::new("sandwich").with_option(OptionSpec::new("-C, --no-cheese", "Hold the cheese")),
    );

    let prompt = ScriptedPrompt::scripted(vec![Answer::Confirm(true), Answer::Confirm(false)]);
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive();

    program
        .invoke(argv(["order", "sandwich", "-i"]))
        .await
        .unwrap();

    // Implied current value is true (cheese on), so the negated question
    // defaults to false; answering yes stores the inverse.
    assert_eq!(prompt.log(), vec!["confirm:Hold the cheese:false"]);
    assert_eq!(
        seen.lock().unwrap().get("cheese"),
        Some(&Value::Bool(false))
    );

    // And the other way around: declining keeps the cheese.
    program
        .invoke(argv(["order", "sandwich", "-i"]))
        .await
        .unwrap();
    assert_eq!(seen.lock().unwrap().get("cheese"), Some(&Value::Bool(true)));
}

#[tokio::test]
async fn test_config_value_becomes_prompt_default_and_is_overridable() {
    let (seen, attach) = capture();
    let sandwich = attach(Command::new("sandwich").with_option(
        OptionSpec::new("-d, --drink <drink>", "Drink").with_choices(["cola", "water", "tea"]),
    ));

    let prompt = ScriptedPrompt::scripted(vec![Answer::Select("water".into())]);
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive();
    program
        .find_subcommand_mut("sandwich")
        .unwrap()
        .set_value_with_source("drink", Value::Str("tea".into()), ValueSource::Config);

    program
        .invoke(argv(["order", "sandwich", "-i"]))
        .await
        .unwrap();

    // The injected value is offered first but does not suppress the prompt.
    assert_eq!(prompt.log(), vec!["select:Drink:tea,cola,water"]);
    assert_eq!(
        seen.lock().unwrap().get("drink"),
        Some(&Value::Str("water".into()))
    );
}

#[tokio::test]
async fn test_input_prompt_validates_and_parses() {
    let (seen, attach) = capture();
    let counter = attach(Command::new("count").with_option(
        OptionSpec::new("-n, --number <number>", "How many").with_parser(|raw| {
            raw.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{raw}' is not a number"))
        }),
    ));

    let prompt = ScriptedPrompt::scripted(vec![Answer::Input("4".into())]);
    let mut program = Command::new("tool")
        .with_subcommand(counter)
        .with_prompter(prompt.clone())
        .interactive();

    program.invoke(argv(["tool", "count", "-i"])).await.unwrap();
    assert_eq!(seen.lock().unwrap().get("number"), Some(&Value::Int(4)));
}

#[tokio::test]
async fn test_empty_input_leaves_optional_option_unset() {
    let (seen, attach) = capture();
    let note =
        attach(Command::new("note").with_option(OptionSpec::new("-t, --text <text>", "Note text")));

    let prompt = ScriptedPrompt::scripted(vec![Answer::Input(String::new())]);
    let mut program = Command::new("tool")
        .with_subcommand(note)
        .with_prompter(prompt.clone())
        .interactive();

    program.invoke(argv(["tool", "note", "-i"])).await.unwrap();
    assert!(!seen.lock().unwrap().contains_key("text"));
}

#[tokio::test]
async fn test_resolution_is_sequential_and_composable() {
    struct GreetingResolver;

    #[async_trait]
    impl Resolver for GreetingResolver {
        async fn resolve(&self, ctx: ResolveContext<'_>) -> Result<Option<Value>> {
            // Depends on the answer given to the prompt right before it.
            let name = ctx
                .values
                .get("name")
                .map(Value::to_text)
                .unwrap_or_default();
            Ok(Some(Value::Str(format!("Hello, {name}!"))))
        }
    }

    let (seen, attach) = capture();
    let greet = attach(
        Command::new("greet")
            .with_option(OptionSpec::new("-n, --name <name>", "Your name"))
            .with_option(
                OptionSpec::new("-g, --greeting <greeting>", "Greeting line")
                    .with_resolver(GreetingResolver),
            ),
    );

    let prompt = ScriptedPrompt::scripted(vec![Answer::Input("World".into())]);
    let mut program = Command::new("tool")
        .with_subcommand(greet)
        .with_prompter(prompt.clone())
        .interactive();

    program.invoke(argv(["tool", "greet", "-i"])).await.unwrap();

    let values = seen.lock().unwrap().clone();
    assert_eq!(values.get("name"), Some(&Value::Str("World".into())));
    assert_eq!(
        values.get("greeting"),
        Some(&Value::Str("Hello, World!".into()))
    );
}

#[tokio::test]
async fn test_required_option_without_answer_aborts_but_keeps_earlier_values() {
    struct NoAnswer {
        calls: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl Resolver for NoAnswer {
        async fn resolve(&self, _ctx: ResolveContext<'_>) -> Result<Option<Value>> {
            *self.calls.lock().unwrap() += 1;
            Ok(None)
        }
    }

    let calls = Arc::new(Mutex::new(0));
    let mut program = Command::new("ops")
        .with_subcommand(
            Command::new("deploy")
                .with_option(OptionSpec::new("-r, --region <region>", "Region"))
                .with_option(
                    OptionSpec::new("-t, --token <token>", "Auth token")
                        .required()
                        .with_resolver(NoAnswer {
                            calls: calls.clone(),
                        }),
                ),
        )
        .with_prompter(ScriptedPrompt::scripted(vec![Answer::Input(
            "eu-west-1".into(),
        )]))
        .interactive();

    let error = program.invoke(argv(["ops", "deploy", "-i"])).await.unwrap_err();
    assert!(
        matches!(error, CommandError::MissingMandatoryOption(flags) if flags == "-t, --token <token>")
    );
    assert_eq!(*calls.lock().unwrap(), 1);
    // The queue aborted mid-way; the region answer stays set.
    assert_eq!(
        program.find_subcommand("deploy").unwrap().get_value("region"),
        Some(&Value::Str("eu-west-1".into()))
    );
}

#[tokio::test]
async fn test_disabled_resolver_skips_prompting() {
    let (seen, attach) = capture();
    let job = attach(
        Command::new("job")
            .with_option(OptionSpec::new("-q, --quiet", "Quiet mode").non_interactive()),
    );

    let prompt = ScriptedPrompt::scripted(Vec::new());
    let mut program = Command::new("tool")
        .with_subcommand(job)
        .with_prompter(prompt.clone())
        .interactive();

    program.invoke(argv(["tool", "job", "-i"])).await.unwrap();
    assert!(prompt.log().is_empty());
    assert!(!seen.lock().unwrap().contains_key("quiet"));
}

#[tokio::test]
async fn test_missing_prompter_is_a_prompt_error() {
    let mut program = Command::new("order")
        .with_subcommand(
            Command::new("sandwich")
                .with_option(OptionSpec::new("-s, --size <size>", "Sandwich size")),
        )
        .interactive();

    let error = program
        .invoke(argv(["order", "sandwich", "-i"]))
        .await
        .unwrap_err();
    assert!(matches!(error, CommandError::Prompt(_)));
}

// ---------------------------------------------------------------------------
// Interactive flag inheritance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_opt_out_flag_is_on_by_default() {
    let (seen, sandwich) = sandwich_command();
    let prompt = ScriptedPrompt::scripted(vec![
        Answer::Confirm(false),
        Answer::Select("medium".into()),
    ]);
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive_with("-I, --no-interactive", "Disable prompts");

    // No flag typed anywhere: the negated declaration implies true.
    program.invoke(argv(["order", "sandwich"])).await.unwrap();
    assert_eq!(prompt.log().len(), 2);
    assert_eq!(
        seen.lock().unwrap().get("size"),
        Some(&Value::Str("medium".into()))
    );
}

#[tokio::test]
async fn test_root_opt_out_silences_descendants() {
    let (seen, sandwich) = sandwich_command();
    let prompt = ScriptedPrompt::scripted(Vec::new());
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive_with("-I, --no-interactive", "Disable prompts");

    // The root's explicit opt-out wins over descendant implied defaults.
    program
        .invoke(argv(["order", "--no-interactive", "sandwich"]))
        .await
        .unwrap();
    assert!(prompt.log().is_empty());
    assert_eq!(
        seen.lock().unwrap().get("size"),
        Some(&Value::Str("medium".into()))
    );
}

#[tokio::test]
async fn test_opt_in_flag_is_off_by_default() {
    let (seen, sandwich) = sandwich_command();
    let prompt = ScriptedPrompt::scripted(Vec::new());
    let mut program = Command::new("order")
        .with_subcommand(sandwich)
        .with_prompter(prompt.clone())
        .interactive();

    program.invoke(argv(["order", "sandwich"])).await.unwrap();
    assert!(prompt.log().is_empty());
    assert_eq!(
        seen.lock().unwrap().get("size"),
        Some(&Value::Str("medium".into()))
    );
}

// ---------------------------------------------------------------------------
// Plugins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sync_plugin_extends_the_tree_before_parsing() {
    let (seen, attach) = capture();
    let mut program = Command::new("tool").with_plugin_fn(move |root| {
        let hello = attach(
            Command::new("hello")
                .with_option(OptionSpec::new("-n, --name <name>", "Name").with_default("world")),
        );
        root.add_subcommand(hello);
        Ok(())
    });

    let outcome = program.invoke(argv(["tool", "hello"])).await.unwrap();
    assert_eq!(outcome, Outcome::Ran);
    assert_eq!(
        seen.lock().unwrap().get("name"),
        Some(&Value::Str("world".into()))
    );
}

#[tokio::test]
async fn test_async_plugin_callback() {
    fn register_goodbye(root: &mut Command) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            root.add_subcommand(Command::new("goodbye").with_action(|_ctx| async { Ok(()) }));
            Ok(())
        })
    }

    let mut program = Command::new("tool").with_plugin_async(register_goodbye);
    let outcome = program.invoke(argv(["tool", "goodbye"])).await.unwrap();
    assert_eq!(outcome, Outcome::Ran);
}

#[tokio::test]
async fn test_module_plugin_registers_once() {
    struct FarewellPlugin {
        registrations: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl CommandPlugin for FarewellPlugin {
        async fn register(&self, root: &mut Command) -> Result<()> {
            *self.registrations.lock().unwrap() += 1;
            root.add_subcommand(Command::new("farewell").with_action(|_ctx| async { Ok(()) }));
            Ok(())
        }
    }

    let registrations = Arc::new(Mutex::new(0));
    let mut program = Command::new("tool").with_plugin(FarewellPlugin {
        registrations: registrations.clone(),
    });

    program.invoke(argv(["tool", "farewell"])).await.unwrap();
    program.invoke(argv(["tool", "farewell"])).await.unwrap();
    assert_eq!(*registrations.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_plugin_may_register_further_plugins() {
    let mut program = Command::new("tool").with_plugin_fn(|root| {
        root.add_plugin_fn(|root| {
            root.add_subcommand(Command::new("nested").with_action(|_ctx| async { Ok(()) }));
            Ok(())
        });
        Ok(())
    });

    let outcome = program.invoke(argv(["tool", "nested"])).await.unwrap();
    assert_eq!(outcome, Outcome::Ran);
}

#[tokio::test]
async fn test_failing_plugin_aborts_before_parsing() {
    let mut program = Command::new("tool")
        .with_plugin_fn(|_root| Err(CommandError::Plugin("backend unreachable".into())));
    let error = program.invoke(argv(["tool"])).await.unwrap_err();
    assert!(matches!(error, CommandError::Plugin(_)));
}

// ---------------------------------------------------------------------------
// Invocation lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_repeat_invocations_reset_parsed_state_but_keep_config() {
    let (seen, attach) = capture();
    let sandwich = attach(
        Command::new("sandwich")
            .with_option(
                OptionSpec::new("-s, --size <size>", "Sandwich size").with_default("medium"),
            )
            .with_option(OptionSpec::new("-d, --drink <drink>", "Drink")),
    );

    let mut program = Command::new("order").with_subcommand(sandwich);
    program
        .find_subcommand_mut("sandwich")
        .unwrap()
        .set_value_with_source("drink", Value::Str("cola".into()), ValueSource::Config);

    program
        .invoke(argv(["order", "sandwich", "--size", "large"]))
        .await
        .unwrap();
    {
        let values = seen.lock().unwrap().clone();
        assert_eq!(values.get("size"), Some(&Value::Str("large".into())));
        assert_eq!(values.get("drink"), Some(&Value::Str("cola".into())));
    }

    // Second run without --size: the previous CLI value must not leak.
    program.invoke(argv(["order", "sandwich"])).await.unwrap();
    let values = seen.lock().unwrap().clone();
    assert_eq!(values.get("size"), Some(&Value::Str("medium".into())));
    assert_eq!(values.get("drink"), Some(&Value::Str("cola".into())));
}

#[tokio::test]
async fn test_duplicate_option_declaration_fails_fast() {
    let mut program = Command::new("order")
        .with_option(OptionSpec::new("-s, --size <size>", "size"))
        .with_option(OptionSpec::new("-S, --size <other>", "size again"));
    let error = program.invoke(argv(["order"])).await.unwrap_err();
    assert!(matches!(error, CommandError::Configuration(_)));
}

#[tokio::test]
async fn test_routing_node_without_action_shows_help() {
    let mut program = Command::new("order").with_subcommand(Command::new("sandwich"));
    let outcome = program.invoke(argv(["order"])).await.unwrap();
    assert_eq!(outcome, Outcome::HelpDisplayed);
}
