use clap::{Args, Subcommand};
use tiffin::{addresses::Address, ids::AddressId};
use tiffin_app::{
    api::{CheckoutApi, NewAddress},
    context::AppContext,
};

#[derive(Debug, Args)]
pub(crate) struct AddressesCommand {
    #[command(subcommand)]
    command: AddressesSubcommand,
}

#[derive(Debug, Subcommand)]
enum AddressesSubcommand {
    /// List saved addresses
    List,

    /// Save a new address
    Add(AddressArgs),

    /// Overwrite a saved address
    Update {
        /// Address id
        id: u64,

        #[command(flatten)]
        address: AddressArgs,
    },

    /// Delete a saved address
    Remove {
        /// Address id
        id: u64,
    },

    /// Make an address the default
    Default {
        /// Address id
        id: u64,
    },
}

#[derive(Debug, Args)]
struct AddressArgs {
    /// Name of the person receiving orders
    #[arg(long)]
    recipient: String,

    /// Contact phone number
    #[arg(long)]
    phone: String,

    /// Street address
    #[arg(long)]
    line: String,

    /// Make this the default address
    #[arg(long)]
    default: bool,
}

impl From<AddressArgs> for NewAddress {
    fn from(args: AddressArgs) -> Self {
        Self {
            recipient_name: args.recipient,
            phone: args.phone,
            address_line: args.line,
            is_default: args.default,
        }
    }
}

pub(crate) async fn run(context: &AppContext, command: AddressesCommand) -> Result<(), String> {
    let api = &context.api;

    match command.command {
        AddressesSubcommand::List => {
            let addresses = api.addresses().await.map_err(failed("list addresses"))?;

            print_addresses(&addresses);
        }
        AddressesSubcommand::Add(args) => {
            let address = api
                .create_address(args.into())
                .await
                .map_err(failed("add address"))?;

            print_address(&address);
        }
        AddressesSubcommand::Update { id, address } => {
            let address = api
                .update_address(AddressId::new(id), address.into())
                .await
                .map_err(failed("update address"))?;

            print_address(&address);
        }
        AddressesSubcommand::Remove { id } => {
            api.delete_address(AddressId::new(id))
                .await
                .map_err(failed("remove address"))?;

            println!("removed address {id}");
        }
        AddressesSubcommand::Default { id } => {
            let addresses = api
                .set_default_address(AddressId::new(id))
                .await
                .map_err(failed("set default address"))?;

            print_addresses(&addresses);
        }
    }

    Ok(())
}

fn failed(action: &'static str) -> impl Fn(tiffin_app::api::ApiError) -> String {
    move |error| format!("failed to {action}: {}", error.user_message())
}

fn print_addresses(addresses: &[Address]) {
    if addresses.is_empty() {
        println!("no saved addresses");
    }

    for address in addresses {
        print_address(address);
    }
}

fn print_address(address: &Address) {
    let marker = if address.is_default { " (default)" } else { "" };

    println!(
        "{}{marker}: {}, {} - {}",
        address.id, address.recipient, address.phone, address.line
    );
}
