use crate::args::ServeArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{http, Config, Result};

/// Serves the HTTP API until interrupted. The address comes from `args` when given, otherwise from
/// `config.json`.
pub async fn serve(config: Config, args: ServeArgs) -> Result<Out<()>> {
    let addr = args.listen().unwrap_or_else(|| config.listen());
    http::serve(config, addr)
        .await
        .pub_result(ErrorType::Service)?;
    Ok(format!("Stopped serving on {addr}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_address_in_use() {
        let env = TestEnv::new().await;
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let args = ServeArgs::new(Some(taken.local_addr().unwrap()));
        let err = serve(env.config(), args).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Service);
        assert!(err.to_string().starts_with("Unable to listen on"));
    }
}
