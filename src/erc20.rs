//! Typed ERC-20 method descriptors and the shielded balance reader.
use ethabi::{ParamType, Token};
use primitive_types::{H160, U256};

use crate::oracle::EncryptionOracle;
use crate::shielded::{self, send_signed_shielded_query};
use crate::wallet::Wallet;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] shielded::Error),

    /// An argument does not match the method's declared parameter types.
    #[error("argument does not match method signature")]
    InvalidArgument,

    #[error("unexpected call result: {0}")]
    UnexpectedResult(&'static str),
}

/// A contract method with a fixed name, parameter list and return shape.
///
/// Arguments are checked against the declared parameters when the call is
/// built, and results against the declared returns when decoded, so a shape
/// mismatch is an error instead of a silently wrong value.
struct Method {
    name: &'static str,
    params: &'static [ParamType],
    output: &'static [ParamType],
}

impl Method {
    fn encode_call(&self, args: &[Token]) -> Result<Vec<u8>, Error> {
        let matches = args.len() == self.params.len()
            && args
                .iter()
                .zip(self.params.iter())
                .all(|(arg, kind)| arg.type_check(kind));
        if !matches {
            return Err(Error::InvalidArgument);
        }
        Ok([
            ethabi::short_signature(self.name, self.params).to_vec(),
            ethabi::encode(args),
        ]
        .concat())
    }

    fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>, Error> {
        ethabi::decode(self.output, data)
            .map_err(|_| Error::UnexpectedResult("undecodable result words"))
    }
}

const BALANCE_OF: Method = Method {
    name: "balanceOf",
    params: &[ParamType::Address],
    output: &[ParamType::Uint(256)],
};

const TRANSFER: Method = Method {
    name: "transfer",
    params: &[ParamType::Address, ParamType::Uint(256)],
    output: &[ParamType::Bool],
};

/// An ERC-20 token contract at a fixed address.
#[derive(Clone, Copy, Debug)]
pub struct Erc20(pub H160);

impl Erc20 {
    pub fn address(&self) -> H160 {
        self.0
    }

    /// Calldata for `balanceOf(owner)`.
    pub fn balance_of(&self, owner: H160) -> Result<Vec<u8>, Error> {
        BALANCE_OF.encode_call(&[Token::Address(owner)])
    }

    /// Calldata for `transfer(to, amount)`.
    pub fn transfer(&self, to: H160, amount: U256) -> Result<Vec<u8>, Error> {
        TRANSFER.encode_call(&[Token::Address(to), Token::Uint(amount)])
    }

    /// Decodes a `balanceOf` result, which must be a single `uint256`.
    pub fn decode_balance(&self, data: &[u8]) -> Result<U256, Error> {
        let mut tokens = BALANCE_OF.decode_output(data)?;
        match (tokens.pop(), tokens.pop()) {
            (Some(Token::Uint(balance)), None) => Ok(balance),
            _ => Err(Error::UnexpectedResult("expected a single uint256")),
        }
    }
}

/// Fetches the wallet's own token balance through a signed shielded query.
pub async fn token_balance(
    wallet: &Wallet,
    oracle: &dyn EncryptionOracle,
    token: &Erc20,
) -> Result<U256, Error> {
    let calldata = token.balance_of(wallet.address())?;
    let response = send_signed_shielded_query(wallet, oracle, token.address(), calldata).await?;
    token.decode_balance(&response)
}
