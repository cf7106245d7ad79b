use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[clap(
    name = "postgraph-node",
    about = "Run GraphQL operations against a blog backed by an in-memory store",
    author = "The postgraph developers & contributors",
    version
)]
pub struct Opt {
    #[clap(
        long,
        short,
        env = "POSTGRAPH_QUERY",
        value_name = "QUERY",
        help = "the query, mutation or subscription to run"
    )]
    pub query: String,
    #[clap(
        long,
        value_name = "JSON",
        help = "the variables of the operation, as a JSON object"
    )]
    pub variables: Option<String>,
    #[clap(
        long,
        value_name = "NAME",
        help = "which operation to run if the query contains several"
    )]
    pub operation_name: Option<String>,
    #[clap(
        long,
        value_name = "N",
        help = "run the query as a subscription and print its first N events"
    )]
    pub subscribe: Option<usize>,
    #[clap(
        long = "trigger",
        value_name = "MUTATION",
        requires = "subscribe",
        help = "a mutation to run once subscribed, may be repeated"
    )]
    pub triggers: Vec<String>,
    #[clap(long, help = "Enable debug logging")]
    pub debug: bool,
}
