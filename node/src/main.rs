use clap::Parser as _;
use std::process::exit;

use graph::futures03::StreamExt;
use graph::log::logger;
use graph::prelude::*;
use postgraph_graphql::prelude::{GraphQlRunner, Query, SubscriptionHub};
use postgraph_store_memory::MemoryStore;
use postgraph_node::{blog, opt, seed};

fn main() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build();
    let runtime = match runtime {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start the runtime: {}", e);
            exit(1);
        }
    };
    exit(runtime.block_on(main_inner()))
}

async fn main_inner() -> i32 {
    let opt = opt::Opt::parse();

    // Set up logger
    let logger = logger(opt.debug);

    match run(&logger, opt).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            crit!(logger, "Failed to run operation"; "error" => format!("{:#}", e));
            2
        }
    }
}

/// Runs the operation described by `opt`. Returns whether every result was
/// free of errors.
async fn run(logger: &Logger, opt: opt::Opt) -> Result<bool, anyhow::Error> {
    let store = Arc::new(MemoryStore::new(logger));
    seed::demo(&store);
    let hub = Arc::new(SubscriptionHub::new(logger));
    let schema = blog::schema(store, hub.cheap_clone())?;
    let runner = GraphQlRunner::new(logger, Arc::new(schema), hub.cheap_clone());

    let variables = match &opt.variables {
        Some(json) => match Value::from_json(serde_json::from_str(json)?) {
            Value::Object(variables) => variables,
            _ => return Err(anyhow!("--variables must be a JSON object")),
        },
        None => Object::new(),
    };
    let query = Query::new(opt.query)
        .with_variables(variables)
        .with_operation_name(opt.operation_name);

    let events = match opt.subscribe {
        Some(events) => events,
        None => {
            let result = runner.run_query(query).await;
            print(&result)?;
            return Ok(!result.has_errors());
        }
    };

    let mut stream = runner
        .run_subscription(query)
        .map_err(|e| anyhow!("{}", e))?
        .take(events);

    for trigger in opt.triggers {
        let result = runner.run_query(Query::new(trigger)).await;
        if result.has_errors() {
            print(&result)?;
        }
    }
    if events > 0 {
        info!(logger, "Waiting for events"; "count" => events);
    }

    let mut ok = true;
    while let Some(result) = stream.next().await {
        ok &= !result.has_errors();
        print(&result)?;
    }
    hub.shutdown();
    Ok(ok)
}

fn print(result: &QueryResult) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
