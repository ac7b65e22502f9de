//! Conversions accepted by [`AlloyChainClient::connect`](crate::AlloyChainClient::connect).

use alloy::{
    network::{Ethereum, Network},
    providers::{
        DynProvider, Provider, RootProvider,
        fillers::{FillProvider, TxFiller},
    },
    transports::http::reqwest::Url,
};

use crate::error::ChainQueryError;

/// Something an [`AlloyChainClient`](crate::AlloyChainClient) can be built on: a ready provider,
/// or an endpoint to connect to.
///
/// Endpoints are connected with [`RootProvider::connect`], which picks HTTP, WebSocket or IPC from
/// the connection string. Live subscriptions need WebSocket or IPC.
pub trait IntoRootProvider<N: Network = Ethereum> {
    /// Resolves `self` to the [`RootProvider`] the scanner talks to.
    ///
    /// # Errors
    ///
    /// Returns [`ChainQueryError::RpcError`] if an endpoint cannot be connected.
    fn into_root_provider(
        self,
    ) -> impl Future<Output = Result<RootProvider<N>, ChainQueryError>> + Send;
}

async fn connect_endpoint<N: Network>(endpoint: &str) -> Result<RootProvider<N>, ChainQueryError> {
    debug!(endpoint = endpoint, "Connecting to node");
    match RootProvider::connect(endpoint).await {
        Ok(provider) => Ok(provider),
        Err(err) => {
            error!(endpoint = endpoint, error = %err, "Failed to connect to node");
            Err(err.into())
        }
    }
}

impl<N: Network> IntoRootProvider<N> for RootProvider<N> {
    async fn into_root_provider(self) -> Result<RootProvider<N>, ChainQueryError> {
        Ok(self)
    }
}

impl<N: Network> IntoRootProvider<N> for &str {
    async fn into_root_provider(self) -> Result<RootProvider<N>, ChainQueryError> {
        connect_endpoint(self).await
    }
}

impl<N: Network> IntoRootProvider<N> for String {
    async fn into_root_provider(self) -> Result<RootProvider<N>, ChainQueryError> {
        connect_endpoint(&self).await
    }
}

impl<N: Network> IntoRootProvider<N> for Url {
    async fn into_root_provider(self) -> Result<RootProvider<N>, ChainQueryError> {
        connect_endpoint(self.as_str()).await
    }
}

// Filler and erased providers resolve to the root they wrap.
impl<F, P, N> IntoRootProvider<N> for FillProvider<F, P, N>
where
    F: TxFiller<N>,
    P: Provider<N>,
    N: Network,
{
    async fn into_root_provider(self) -> Result<RootProvider<N>, ChainQueryError> {
        Ok(self.root().clone())
    }
}

impl<N: Network> IntoRootProvider<N> for DynProvider<N> {
    async fn into_root_provider(self) -> Result<RootProvider<N>, ChainQueryError> {
        Ok(self.root().clone())
    }
}
