use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::{Parser, Subcommand};
use josekit::jwk::Jwk;
use josekit::jws::{HS256, JwsSigner as _};
use uuid::Uuid;

use rest_dispatch::app;
use rest_dispatch::config::Config;
use rest_dispatch::dispatch::RequestInput;
use rest_dispatch::endpoints;
use rest_dispatch::routing::RouteMapBuilder;
use rest_dispatch::routing::route_map::CACHE_FILE_NAME;
use rest_dispatch::services::auth::key_store::key_file;

/// Operator tool for the rest dispatcher: key files, test tokens and the route map.
#[derive(Parser, Debug)]
#[command(name = "restctl", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a fresh HS256 key as `{keys_path}/{app_name}.cache` (JWK, kty=oct)
    Keygen {
        #[arg(long, value_name = "DIR")]
        keys_path: PathBuf,
        #[arg(long)]
        app_name: String,
        /// Secret length in bytes
        #[arg(long, default_value_t = 32)]
        bytes: u8,
        /// Replace an existing key file
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Mint an HS256 access token accepted by the dispatcher
    Token {
        #[arg(long, value_name = "DIR")]
        keys_path: PathBuf,
        /// Used as `aud` and to locate the key file
        #[arg(long)]
        app_name: String,
        #[arg(long)]
        sub: String,
        #[arg(long, default_value = "restctl")]
        iss: String,
        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: i64,
        /// Not-before offset from now, in seconds
        #[arg(long)]
        nbf: Option<i64>,
        /// Print only the token
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },

    /// Build the route map from an endpoint directory and print it
    Routes {
        #[arg(long, value_name = "DIR")]
        endpoint_path: PathBuf,
        #[arg(long, default_value = endpoints::NAMESPACE)]
        namespace: String,
        /// Also write `rest-service-map.cache` into this directory
        #[arg(long, value_name = "DIR")]
        cache_path: Option<PathBuf>,
    },

    /// Run one request through the dispatcher from the command line
    Call { method: String, path: String },
}

fn b64url_json(value: &serde_json::Value) -> Result<String> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

fn keygen(keys_path: PathBuf, app_name: &str, bytes: u8, force: bool) -> Result<()> {
    let path = key_file(&keys_path, app_name);
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace)", path.display());
    }

    let jwk = Jwk::generate_oct_key(bytes)?;
    fs::create_dir_all(&keys_path)?;
    fs::write(&path, jwk.to_string()).with_context(|| format!("write {}", path.display()))?;

    println!("key: {}", path.display());
    Ok(())
}

fn token(
    keys_path: PathBuf,
    app_name: &str,
    sub: String,
    iss: String,
    ttl: i64,
    nbf: Option<i64>,
) -> Result<String> {
    let path = key_file(&keys_path, app_name);
    let jwk = Jwk::from_bytes(fs::read(&path).with_context(|| format!("read {}", path.display()))?)?;
    let signer = HS256.signer_from_jwk(&jwk)?;

    let now = chrono::Utc::now().timestamp();
    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });

    let mut claims = serde_json::json!({
        "iss": iss,
        "sub": sub,
        "aud": app_name,
        "iat": now,
        "exp": now + ttl,
        "jti": Uuid::new_v4().to_string(),
    });
    if let Some(offset) = nbf {
        claims["nbf"] = serde_json::Value::from(now + offset);
    }

    let signing_input = format!("{}.{}", b64url_json(&header)?, b64url_json(&claims)?);
    let sig = signer.sign(signing_input.as_bytes())?;
    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(sig)))
}

fn routes(endpoint_path: PathBuf, namespace: &str, cache_path: Option<PathBuf>) -> Result<()> {
    let registry = endpoints::registry(namespace);
    let builder = RouteMapBuilder::new(&registry);

    let map = match cache_path {
        Some(dir) => {
            fs::create_dir_all(&dir)?;
            builder.build_and_persist(&endpoint_path, namespace, &dir.join(CACHE_FILE_NAME))?
        }
        None => builder.build(&endpoint_path, namespace)?,
    };

    for (method, path, target) in map.iter() {
        println!("{:<7} /{:<30} {}", method.as_str(), path, target);
    }
    Ok(())
}

fn call(method: String, path: String) -> Result<()> {
    let config = Config::from_env()?;
    let state = app::build_state(&config)?;
    let dispatcher = Arc::clone(&state.dispatcher);

    let reply = dispatcher.dispatch(RequestInput::cli(method, path));
    println!("{}", reply.status);
    if let Some(body) = reply.body {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    if !reply.status.is_success() {
        bail!("request failed with {}", reply.status);
    }
    Ok(())
}

fn main() -> Result<()> {
    match Args::parse().command {
        Command::Keygen {
            keys_path,
            app_name,
            bytes,
            force,
        } => keygen(keys_path, &app_name, bytes, force),
        Command::Token {
            keys_path,
            app_name,
            sub,
            iss,
            ttl,
            nbf,
            quiet,
        } => {
            let token = token(keys_path, &app_name, sub, iss, ttl, nbf)?;
            if quiet {
                println!("{}", token);
            } else {
                println!("token: {}", token);
                println!("aud: {}", app_name);
                println!("expires in: {}s", ttl);
            }
            Ok(())
        }
        Command::Routes {
            endpoint_path,
            namespace,
            cache_path,
        } => routes(endpoint_path, &namespace, cache_path),
        Command::Call { method, path } => call(method, path),
    }
}
