use super::{ArgType, OperatorSignature, Param, Return, SignatureError};
use crate::value::IValue;
use winnow::ascii::{digit1, multispace0, multispace1};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, separated};
use winnow::error::{StrContext, StrContextValue};
use winnow::token::{take_till, take_while};
use winnow::{ModalResult, Parser};

pub(super) fn parse(text: &str) -> Result<OperatorSignature, SignatureError> {
    signature.parse(text).map_err(|err| {
        let reason = err.inner().to_string();
        SignatureError::Malformed {
            src: text.to_string(),
            span: (err.offset(), 1).into(),
            reason: if reason.is_empty() {
                "unexpected token".to_string()
            } else {
                reason
            },
        }
    })
}

fn signature(input: &mut &str) -> ModalResult<OperatorSignature> {
    multispace0.parse_next(input)?;
    let namespace = ident
        .context(StrContext::Label("namespace"))
        .parse_next(input)?;
    cut_err("::")
        .context(StrContext::Expected(StrContextValue::StringLiteral("::")))
        .parse_next(input)?;
    let name = cut_err(ident)
        .context(StrContext::Label("operator name"))
        .parse_next(input)?;
    let overload = opt(preceded('.', cut_err(ident))).parse_next(input)?;
    multispace0.parse_next(input)?;
    let params = cut_err(delimited(('(', multispace0), param_list, (multispace0, ')')))
        .context(StrContext::Label("parameter list"))
        .parse_next(input)?;
    cut_err((multispace0, "->", multispace0))
        .context(StrContext::Expected(StrContextValue::StringLiteral("->")))
        .parse_next(input)?;
    let returns = cut_err(return_list)
        .context(StrContext::Label("return list"))
        .parse_next(input)?;
    multispace0.parse_next(input)?;
    Ok(OperatorSignature {
        namespace,
        name,
        overload,
        params,
        returns,
    })
}

fn ident(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c == '_' || c.is_ascii_alphanumeric())
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn comma(input: &mut &str) -> ModalResult<()> {
    (multispace0, ',', multispace0).void().parse_next(input)
}

fn param_list(input: &mut &str) -> ModalResult<Vec<Param>> {
    let items: Vec<Option<Param>> = separated(0.., param_item, comma).parse_next(input)?;
    Ok(items.into_iter().flatten().collect())
}

/// A parameter, or the bare `*` that opens keyword-only parameters.
fn param_item(input: &mut &str) -> ModalResult<Option<Param>> {
    alt(('*'.value(None), param.map(Some))).parse_next(input)
}

fn param(input: &mut &str) -> ModalResult<Param> {
    let ty = arg_type.parse_next(input)?;
    multispace1.parse_next(input)?;
    let name = ident
        .context(StrContext::Label("parameter name"))
        .parse_next(input)?;
    let default = opt(preceded(
        (multispace0, '=', multispace0),
        cut_err(default_value).context(StrContext::Label("default value")),
    ))
    .parse_next(input)?;
    Ok(Param { ty, name, default })
}

fn arg_type(input: &mut &str) -> ModalResult<ArgType> {
    let base = alt((
        "Tensor".value(ArgType::Tensor),
        "Scalar".value(ArgType::Scalar),
        "int".value(ArgType::Int),
        "float".value(ArgType::Float),
        "bool".value(ArgType::Bool),
        "str".value(ArgType::Str),
    ))
    .context(StrContext::Label("type"))
    .parse_next(input)?;
    let list = opt(delimited('[', opt(digit1.parse_to::<usize>()), cut_err(']')))
        .parse_next(input)?;
    let ty = match list {
        Some(len) => ArgType::List {
            elem: Box::new(base),
            len,
        },
        None => base,
    };
    if opt('?').parse_next(input)?.is_some() {
        return Ok(ArgType::Optional(Box::new(ty)));
    }
    Ok(ty)
}

fn default_value(input: &mut &str) -> ModalResult<IValue> {
    alt((
        "None".value(IValue::None),
        "True".value(IValue::Bool(true)),
        "False".value(IValue::Bool(false)),
        number_list,
        number,
        string_literal,
    ))
    .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<IValue> {
    take_while(1.., |c: char| {
        c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
    })
    .try_map(parse_number)
    .parse_next(input)
}

fn parse_number(text: &str) -> Result<IValue, std::num::ParseFloatError> {
    if let Ok(value) = text.parse::<i64>() {
        return Ok(IValue::Int(value));
    }
    text.parse::<f64>().map(IValue::Double)
}

fn number_list(input: &mut &str) -> ModalResult<IValue> {
    let items: Vec<IValue> = delimited(
        ('[', multispace0),
        separated(0.., number, comma),
        (multispace0, cut_err(']')),
    )
    .parse_next(input)?;
    if items.iter().all(|item| matches!(item, IValue::Int(_))) {
        let values = items
            .into_iter()
            .filter_map(|item| match item {
                IValue::Int(value) => Some(value),
                _ => None,
            })
            .collect();
        return Ok(IValue::IntList(values));
    }
    let values = items
        .into_iter()
        .filter_map(|item| match item {
            IValue::Int(value) => Some(value as f64),
            IValue::Double(value) => Some(value),
            _ => None,
        })
        .collect();
    Ok(IValue::DoubleList(values))
}

fn string_literal(input: &mut &str) -> ModalResult<IValue> {
    delimited('"', take_till(0.., '"'), cut_err('"'))
        .map(|s: &str| IValue::Str(s.to_string()))
        .parse_next(input)
}

fn return_list(input: &mut &str) -> ModalResult<Vec<Return>> {
    alt((parenthesized_returns, return_item.map(|item| vec![item]))).parse_next(input)
}

fn parenthesized_returns(input: &mut &str) -> ModalResult<Vec<Return>> {
    delimited(
        ('(', multispace0),
        separated(0.., return_item, comma),
        (multispace0, ')'),
    )
    .parse_next(input)
}

fn return_item(input: &mut &str) -> ModalResult<Return> {
    let ty = arg_type.parse_next(input)?;
    let name = opt(preceded(multispace1, ident)).parse_next(input)?;
    Ok(Return { ty, name })
}
