//! Conversion of verified checkout responses into [`TokenizedCard`].

use crate::{
    crypto::Verified,
    error::{Result, TokenizerError},
    models::{CheckoutResult, GatewayResponse, TokenizedCard},
};

/// Maps a verified checkout response to the public card token.
///
/// The expiration string is split into two-character groups; the first group is
/// reported as `year` and the second as `month`. The checkout backend has always
/// been read this way, so `"0928"` yields `year = 9`, `month = 28`.
///
/// # Errors
///
/// Returns [`TokenizerError::InvalidResponse`] if the card fields are malformed,
/// the token details are missing or the expiration string does not yield two
/// numeric groups.
pub fn normalize(response: Verified<GatewayResponse>, request_id: &str) -> Result<TokenizedCard> {
    let response: CheckoutResult = serde_json::from_value(response.into_inner().into_body())
        .map_err(|e| TokenizerError::InvalidResponse(format!("malformed checkout response: {e}")))?;

    let result = response
        .result
        .ok_or_else(|| TokenizerError::InvalidResponse("missing result".to_owned()))?;
    let expiration = response
        .expiration_date
        .ok_or_else(|| TokenizerError::InvalidResponse("missing expiration_date".to_owned()))?;
    let (year, month) = split_expiration(&expiration)?;

    Ok(TokenizedCard {
        token: result.token,
        last4: result.last_digits,
        bin: result.bin,
        year,
        month,
        name: response.card_holder,
        nick: response.nickname,
        brand: response.brand,
        request_id: request_id.to_owned(),
    })
}

fn split_expiration(expiration: &str) -> Result<(u32, u32)> {
    let chars: Vec<char> = expiration.chars().collect();
    let mut groups = chars.chunks(2).map(|group| group.iter().collect::<String>());

    let mut next_number = |label: &str| -> Result<u32> {
        let group = groups.next().ok_or_else(|| {
            TokenizerError::InvalidResponse(format!(
                "expiration_date {expiration:?} has no {label}"
            ))
        })?;
        group.parse().map_err(|_| {
            TokenizerError::InvalidResponse(format!(
                "expiration_date {expiration:?} has non-numeric {label}"
            ))
        })
    };

    let year = next_number("year")?;
    let month = next_number("month")?;
    Ok((year, month))
}
