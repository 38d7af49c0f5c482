//! services/client/src/cli.rs
//!
//! The `vytal` command line: argument definitions and one handler per command.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;
use vytal_core::catalog::find_service;
use vytal_core::domain::{bookable_dates_from_today, TIME_SLOTS};
use vytal_core::{
    Address, AuthError, BookingPlan, Location, LoginOutcome, PaymentMode, ProfileForm,
    ServiceCategory, Sex, SlotSelection, UserProfile,
};

use crate::error::ClientError;
use crate::state::AppState;

/// How many codes a user may try before the command gives up.
const MAX_CODE_ATTEMPTS: usize = 3;

//=========================================================================================
// Argument Definitions
//=========================================================================================

#[derive(Parser, Debug)]
#[command(name = "vytal", about = "Book VytalYou health services from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show who is signed in and whether the backend is reachable
    Status,
    /// Sign in with a phone number and a one-time code
    Login { phone: String },
    /// Sign out and forget the stored session
    Logout,
    /// View or edit the profile
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Manage the visit address
    #[command(subcommand)]
    Address(AddressCommand),
    /// List services, optionally by category
    Services {
        #[arg(long)]
        category: Option<ServiceCategory>,
    },
    /// Show one service
    Service { id: String },
    /// List the dates and time slots that can be booked
    Slots,
    /// Book an appointment
    Book(BookArgs),
    /// Mark the introduction as seen
    Onboarded,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    Show,
    Refresh,
    /// Fill in the details required before booking
    Complete {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long, value_enum)]
        sex: SexArg,
        #[command(flatten)]
        address: AddressArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum AddressCommand {
    /// Save an address typed by hand
    Set(AddressArgs),
    /// Look up the address at a point and optionally save it
    Detect {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct AddressArgs {
    #[arg(long)]
    pub street: Option<String>,
    #[arg(long)]
    pub landmark: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub pincode: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub formatted: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl AddressArgs {
    fn is_empty(&self) -> bool {
        self.street.is_none() && self.formatted.is_none() && self.city.is_none()
    }

    /// Builds a location, keeping coordinates from `current` when none are given.
    fn to_location(&self, current: Option<&Location>) -> Location {
        Location {
            latitude: self
                .lat
                .or(current.map(|l| l.latitude))
                .unwrap_or_default(),
            longitude: self
                .lon
                .or(current.map(|l| l.longitude))
                .unwrap_or_default(),
            address: Address {
                street: self.street.clone().unwrap_or_default(),
                landmark: self.landmark.clone().unwrap_or_default(),
                city: self.city.clone().unwrap_or_default(),
                state: self.state.clone().unwrap_or_default(),
                pincode: self.pincode.clone().unwrap_or_default(),
                country: self.country.clone().unwrap_or_default(),
                formatted_address: self.formatted.clone().unwrap_or_default(),
            },
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SexArg {
    Male,
    Female,
    Other,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
            SexArg::Other => Sex::Other,
        }
    }
}

#[derive(Args, Debug)]
pub struct BookArgs {
    pub service_id: String,
    /// Appointment date, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Time slot label, e.g. "09:00 AM"
    #[arg(long)]
    pub slot: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Pay before booking
    #[arg(long)]
    pub paid: bool,
    /// Override the configured amount, in the smallest currency unit
    #[arg(long, requires = "paid")]
    pub amount: Option<u64>,
}

//=========================================================================================
// Handlers
//=========================================================================================

pub async fn run(command: Command, state: &AppState) -> Result<(), ClientError> {
    match command {
        Command::Status => status(state).await,
        Command::Login { phone } => login(state, &phone).await,
        Command::Logout => {
            state.session.logout().await;
            println!("Signed out.");
            Ok(())
        }
        Command::Profile(cmd) => profile(state, cmd).await,
        Command::Address(cmd) => address(state, cmd).await,
        Command::Services { category } => services(state, category).await,
        Command::Service { id } => {
            match find_service(state.catalog.as_ref(), &id).await {
                Some(service) => {
                    println!("{} ({})", service.title, service.id);
                    for line in [&service.subtitle, &service.price, &service.session_info]
                        .into_iter()
                        .flatten()
                    {
                        println!("  {}", line);
                    }
                    if let Some(description) = &service.full_description {
                        println!("\n{}", description);
                    }
                    for bullet in &service.bullets {
                        println!("  - {}", bullet);
                    }
                }
                None => println!("Service '{}' was not found.", id),
            }
            Ok(())
        }
        Command::Slots => {
            let dates: Vec<String> = bookable_dates_from_today()
                .iter()
                .map(|d| d.format("%a %d %b").to_string())
                .collect();
            println!("Dates: {}", dates.join(", "));
            println!("Slots: {}", TIME_SLOTS.join(", "));
            Ok(())
        }
        Command::Book(args) => book(state, args).await,
        Command::Onboarded => {
            state.onboarding.mark_completed(true).await;
            Ok(())
        }
    }
}

async fn status(state: &AppState) -> Result<(), ClientError> {
    let session = state.session.snapshot();
    match (&session.user, session.is_authenticated) {
        (Some(user), true) => print_user(user),
        _ => println!("Not signed in."),
    }
    if let Some(route) = &session.return_route {
        println!("Pending destination: {}", route);
    }
    if !state.onboarding.is_completed().await {
        println!("Tip: run `vytal slots` to see when appointments are available.");
    }
    match state.catalog.health_check().await {
        Ok(true) => println!("Backend: reachable"),
        Ok(false) => println!("Backend: degraded"),
        Err(e) => println!("Backend: unreachable ({})", e),
    }
    Ok(())
}

fn print_user(user: &UserProfile) {
    println!("Signed in as {}", user.name.as_deref().unwrap_or(&user.phone));
    println!("  phone: {}", user.phone);
    if let Some(age) = user.age {
        println!("  age: {}", age);
    }
    if let Some(sex) = user.sex {
        println!("  sex: {:?}", sex);
    }
    match user.address().filter(|a| a.is_deliverable()) {
        Some(address) => println!("  address: {}", address.display_line()),
        None => println!("  address: none saved"),
    }
    if !user.profile_completed {
        println!("  profile incomplete: run `vytal profile complete`");
    }
}

async fn read_line<R>(input: &mut R, prompt: &str) -> Result<String, ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

async fn login(state: &AppState, phone: &str) -> Result<(), ClientError> {
    let mut challenge = state.auth.request_otp(phone).await?;
    println!("Code sent to {}.", challenge.phone_number);
    let mut input = BufReader::new(tokio::io::stdin());

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = read_line(&mut input, "Enter the 6-digit code (or 'resend'): ").await?;
        if code.eq_ignore_ascii_case("resend") {
            challenge = state.auth.resend_otp(&challenge).await?;
            println!("OTP sent successfully");
            continue;
        }
        match state.auth.verify_otp(&challenge, &code).await {
            Ok(LoginOutcome::ProfileComplete) => {
                println!("Signed in.");
                return Ok(());
            }
            Ok(LoginOutcome::ProfileIncomplete) => {
                println!("Signed in. Complete your profile with `vytal profile complete`.");
                return Ok(());
            }
            Err(e @ (AuthError::InvalidCode | AuthError::VerificationFailed(_)))
                if attempt < MAX_CODE_ATTEMPTS =>
            {
                println!("{}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(AuthError::VerificationFailed("Too many attempts".to_string()).into())
}

async fn profile(state: &AppState, cmd: ProfileCommand) -> Result<(), ClientError> {
    match cmd {
        ProfileCommand::Show => match state.session.user() {
            Some(user) => print_user(&user),
            None => println!("Not signed in."),
        },
        ProfileCommand::Refresh => print_user(&state.profile.refresh_profile().await?),
        ProfileCommand::Complete {
            name,
            age,
            sex,
            address,
        } => {
            let current = state.session.user().and_then(|u| u.location);
            let location = if address.is_empty() {
                current
            } else {
                Some(address.to_location(current.as_ref()))
            };
            let form = ProfileForm {
                name,
                age,
                sex: sex.into(),
                location,
            };
            let user = state.profile.complete_profile(form).await?;
            println!("Profile completed successfully");
            print_user(&user);
        }
    }
    Ok(())
}

async fn address(state: &AppState, cmd: AddressCommand) -> Result<(), ClientError> {
    match cmd {
        AddressCommand::Set(args) => {
            let current = state.session.user().and_then(|u| u.location);
            let user = state
                .profile
                .save_address(args.to_location(current.as_ref()))
                .await?;
            println!("Address saved successfully");
            print_user(&user);
        }
        AddressCommand::Detect { lat, lon, save } => {
            let fix = state.location_resolver(lat, lon).resolve().await?;
            if fix.is_partial() {
                println!("Location fetched, but address not found.");
            } else {
                println!("Address: {}", fix.location.address.display_line());
            }
            if save {
                if !fix.location.address.is_deliverable() {
                    warn!("Detected address is blank; not saving");
                    println!("Enter the address by hand with `vytal address set`.");
                    return Ok(());
                }
                state.profile.save_address(fix.location).await?;
                println!("Address saved successfully");
            }
        }
    }
    Ok(())
}

async fn services(state: &AppState, category: Option<ServiceCategory>) -> Result<(), ClientError> {
    let services = state.catalog.list_services(category).await?;
    if services.is_empty() {
        println!("No services found.");
    }
    for service in services {
        println!(
            "{:<24} {:<40} {}",
            service.id,
            service.title,
            service.price.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Rejects dates outside the booking window and unknown slot labels.
fn check_selection(
    date: Option<NaiveDate>,
    slot: Option<&str>,
    window: &[NaiveDate],
) -> Result<(), ClientError> {
    if let Some(date) = date {
        if !window.contains(&date) {
            return Err(ClientError::InvalidInput(format!(
                "{} is outside the booking window; see `vytal slots`",
                date
            )));
        }
    }
    if let Some(slot) = slot {
        if !TIME_SLOTS.contains(&slot) {
            return Err(ClientError::InvalidInput(format!(
                "'{}' is not an offered slot; see `vytal slots`",
                slot
            )));
        }
    }
    Ok(())
}

async fn book(state: &AppState, args: BookArgs) -> Result<(), ClientError> {
    check_selection(
        args.date,
        args.slot.as_deref(),
        &bookable_dates_from_today(),
    )?;

    let mode = if args.paid {
        PaymentMode::Paid {
            amount: args.amount.unwrap_or(state.config.payment_amount),
        }
    } else {
        PaymentMode::Direct
    };
    let plan = BookingPlan {
        service_id: args.service_id,
        selection: SlotSelection {
            date: args
                .date
                .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))),
            time_slot: args.slot,
        },
        notes: args.notes,
        mode,
    };

    match state.booking.book(plan).await {
        Ok(outcome) => {
            println!("Appointment Request Sent! We will contact you shortly.");
            if let Some(payment_id) = outcome.payment_id {
                println!("Payment reference: {}", payment_id);
            }
            Ok(())
        }
        Err(e) => {
            if e == vytal_core::BookingError::NotAuthenticated {
                state.session.set_return_route(Some("BookAppointment".to_string())).await;
            }
            Err(e.into())
        }
    }
}
