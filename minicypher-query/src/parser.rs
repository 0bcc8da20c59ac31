use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token, TokenType};

pub struct Parser;

impl Parser {
    pub fn parse(input: &str) -> Result<Query> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = TokenParser::new(input, tokens);
        parser.parse_query()
    }
}

struct TokenParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> TokenParser<'a> {
    // Pratt parser binding powers (higher = tighter binding).
    const BP_OR: u8 = 10;
    const BP_AND: u8 = 30;
    const BP_CMP: u8 = 40;
    const BP_PRED: u8 = 45;
    const BP_ADD: u8 = 50;
    const BP_MUL: u8 = 60;
    const BP_PREFIX: u8 = 80;
    const BP_NOT: u8 = 40;

    fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            position: 0,
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        let mut matches = Vec::new();
        if !self.check(&TokenType::Match) {
            return Err(self.error_here("expected MATCH"));
        }
        while self.match_token(&TokenType::Match) {
            matches.push(self.parse_match()?);
        }

        let where_clause = if self.check(&TokenType::Where) {
            let where_token = self.advance().clone();
            let expression = self.parse_expression()?;
            if expression.has_aggregate() {
                return Err(Error::parse(
                    where_token.line,
                    where_token.column,
                    "aggregate calls are not allowed in WHERE",
                ));
            }
            Some(expression)
        } else {
            None
        };

        self.consume(&TokenType::Return, "expected RETURN")?;
        let return_clause = self.parse_return()?;

        if !self.is_at_end() {
            return Err(self.error_here("unexpected input after query"));
        }

        Ok(Query {
            matches,
            where_clause,
            return_clause,
        })
    }

    fn parse_match(&mut self) -> Result<MatchClause> {
        let mut elements = Vec::new();
        elements.push(PathElement::Node(self.parse_node_pattern()?));
        while self.check_edge_start() {
            elements.push(PathElement::Edge(self.parse_edge_pattern()?));
            elements.push(PathElement::Node(self.parse_node_pattern()?));
        }
        Ok(MatchClause { elements })
    }

    fn check_edge_start(&self) -> bool {
        matches!(
            self.peek().token_type,
            TokenType::LeftArrow | TokenType::Dash
        )
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        self.consume(&TokenType::LeftParen, "expected '('")?;
        let variable = if self.peek_is_identifier() {
            Some(self.parse_identifier("node variable")?)
        } else {
            None
        };

        let labels = if self.check(&TokenType::Colon) {
            Some(self.parse_label_expr()?)
        } else {
            None
        };

        let properties = if self.check(&TokenType::LeftBrace) {
            self.parse_property_map()?
        } else {
            Vec::new()
        };

        self.consume(&TokenType::RightParen, "expected ')'")?;
        Ok(NodePattern {
            variable,
            labels,
            properties,
        })
    }

    /// Parses `:A|B` / `:A:B` chains into DNF alternatives: pipes widen
    /// the union, a further colon conjoins an atom into every alternative.
    fn parse_label_expr(&mut self) -> Result<LabelExpr> {
        let mut alternatives: Vec<Vec<String>> = Vec::new();
        while self.match_token(&TokenType::Colon) {
            let mut group = vec![self.parse_identifier("label")?];
            while self.match_token(&TokenType::Pipe) {
                group.push(self.parse_identifier("label")?);
            }
            if alternatives.is_empty() {
                alternatives = group.into_iter().map(|atom| vec![atom]).collect();
            } else {
                let mut widened = Vec::new();
                for alt in &alternatives {
                    for atom in &group {
                        let mut conjoined = alt.clone();
                        conjoined.push(atom.clone());
                        widened.push(conjoined);
                    }
                }
                alternatives = widened;
            }
        }
        Ok(LabelExpr { alternatives })
    }

    fn parse_edge_pattern(&mut self) -> Result<EdgePattern> {
        let mut direction = if self.match_token(&TokenType::LeftArrow) {
            EdgeDirection::Reverse
        } else if self.match_token(&TokenType::Dash) {
            EdgeDirection::Either
        } else {
            return Err(self.error_here("expected edge pattern"));
        };

        let mut variable = None;
        let mut labels = None;
        let mut properties = Vec::new();
        let mut hops = HopRange::SINGLE;

        if self.match_token(&TokenType::LeftBracket) {
            if self.peek_is_identifier() {
                variable = Some(self.parse_identifier("edge variable")?);
            }

            if self.check(&TokenType::Colon) {
                labels = Some(self.parse_label_expr()?);
            }

            if self.match_token(&TokenType::Asterisk) {
                hops = self.parse_hop_range()?;
            }

            if self.check(&TokenType::LeftBrace) {
                properties = self.parse_property_map()?;
            }

            self.consume(&TokenType::RightBracket, "expected ']'")?;
        }

        if self.match_token(&TokenType::RightArrow) {
            direction = if direction == EdgeDirection::Reverse {
                EdgeDirection::Either
            } else {
                EdgeDirection::Forward
            };
        } else if self.match_token(&TokenType::Dash) {
            // Keep the prefix direction: `<-[]-` stays Reverse, `-[]-` Either.
        } else {
            return Err(self.error_here("expected '->' or '-' to close edge pattern"));
        }

        Ok(EdgePattern {
            variable,
            labels,
            properties,
            direction,
            hops,
        })
    }

    /// `*` = 1..∞, `*n` = n..n, `*..m` = 1..m, `*n..` = n..∞, `*n..m`.
    fn parse_hop_range(&mut self) -> Result<HopRange> {
        if matches!(self.peek().token_type, TokenType::Integer(_)) {
            let min = self.parse_unsigned("hop count")? as u32;
            if self.match_token(&TokenType::RangeDots) {
                let max = if matches!(self.peek().token_type, TokenType::Integer(_)) {
                    Some(self.parse_unsigned("hop count")? as u32)
                } else {
                    None
                };
                return Ok(HopRange { min, max });
            }
            return Ok(HopRange {
                min,
                max: Some(min),
            });
        }
        if self.match_token(&TokenType::RangeDots) {
            let max = if matches!(self.peek().token_type, TokenType::Integer(_)) {
                Some(self.parse_unsigned("hop count")? as u32)
            } else {
                None
            };
            return Ok(HopRange { min: 1, max });
        }
        Ok(HopRange { min: 1, max: None })
    }

    fn parse_property_map(&mut self) -> Result<Vec<(String, Literal)>> {
        self.consume(&TokenType::LeftBrace, "expected '{'")?;
        let mut properties = Vec::new();

        while !self.check(&TokenType::RightBrace) {
            let key = self.parse_property_key()?;
            self.consume(&TokenType::Colon, "expected ':' in property map")?;
            let value = self.parse_literal()?;
            properties.push((key, value));

            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }

        self.consume(&TokenType::RightBrace, "expected '}'")?;
        Ok(properties)
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let negative = self.match_token(&TokenType::Dash);
        let token = self.advance().clone();
        let literal = match token.token_type {
            TokenType::Integer(n) => Literal::Integer(if negative { -n } else { n }),
            TokenType::Float(f) => Literal::Float(if negative { -f } else { f }),
            TokenType::String(s) if !negative => Literal::String(s),
            TokenType::Boolean(b) if !negative => Literal::Boolean(b),
            TokenType::Null if !negative => Literal::Null,
            _ => {
                return Err(Error::parse(
                    token.line,
                    token.column,
                    "expected literal value",
                ));
            }
        };
        Ok(literal)
    }

    fn parse_return(&mut self) -> Result<ReturnClause> {
        let distinct = self.match_token(&TokenType::Distinct);
        let mut items = Vec::new();

        loop {
            items.push(self.parse_return_item()?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }

        let order_by = if self.match_token(&TokenType::Order) {
            self.consume(&TokenType::By, "expected BY after ORDER")?;
            self.parse_order_by()?
        } else {
            Vec::new()
        };

        let skip = if self.match_token(&TokenType::Skip) {
            Some(self.parse_unsigned("SKIP")?)
        } else {
            None
        };

        let limit = if self.match_token(&TokenType::Limit) {
            Some(self.parse_unsigned("LIMIT")?)
        } else {
            None
        };

        Ok(ReturnClause {
            distinct,
            items,
            order_by,
            skip,
            limit,
        })
    }

    fn parse_return_item(&mut self) -> Result<ReturnItem> {
        let start = self.peek().offset;
        let expression = self.parse_expression()?;
        // Slice up to the end of the last token the expression consumed,
        // so trailing whitespace and comments stay out of column labels.
        let end = self.tokens[self.position - 1].end;
        let text = self.source[start..end].trim().to_string();

        let alias = if self.match_token(&TokenType::As) {
            Some(self.parse_identifier("alias after AS")?)
        } else {
            None
        };

        Ok(ReturnItem {
            expression,
            alias,
            text,
        })
    }

    fn parse_order_by(&mut self) -> Result<Vec<OrderByItem>> {
        let mut items = Vec::new();
        loop {
            let expression = self.parse_expression()?;
            let direction = if self.match_token(&TokenType::Asc) {
                SortDirection::Ascending
            } else if self.match_token(&TokenType::Desc) {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };

            items.push(OrderByItem {
                expression,
                direction,
            });

            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_unsigned(&mut self, ctx: &'static str) -> Result<u64> {
        let token = self.advance().clone();
        match token.token_type {
            TokenType::Integer(n) if n >= 0 => Ok(n as u64),
            _ => Err(Error::parse(
                token.line,
                token.column,
                format!("expected non-negative integer after {ctx}"),
            )),
        }
    }

    fn parse_property_key(&mut self) -> Result<String> {
        let token = self.advance().clone();
        let key = match token.token_type {
            TokenType::Identifier(name) => name,
            TokenType::String(name) => name,
            // Keywords double as property keys inside `{...}`.
            TokenType::Match => "match".to_string(),
            TokenType::Where => "where".to_string(),
            TokenType::Return => "return".to_string(),
            TokenType::Distinct => "distinct".to_string(),
            TokenType::Order => "order".to_string(),
            TokenType::By => "by".to_string(),
            TokenType::Asc => "asc".to_string(),
            TokenType::Desc => "desc".to_string(),
            TokenType::Skip => "skip".to_string(),
            TokenType::Limit => "limit".to_string(),
            TokenType::And => "and".to_string(),
            TokenType::Or => "or".to_string(),
            TokenType::Not => "not".to_string(),
            TokenType::Is => "is".to_string(),
            TokenType::In => "in".to_string(),
            TokenType::Starts => "starts".to_string(),
            TokenType::Ends => "ends".to_string(),
            TokenType::Contains => "contains".to_string(),
            TokenType::With => "with".to_string(),
            TokenType::As => "as".to_string(),
            _ => {
                return Err(Error::parse(
                    token.line,
                    token.column,
                    "expected property key",
                ));
            }
        };
        Ok(key)
    }

    fn parse_identifier(&mut self, ctx: &'static str) -> Result<String> {
        let token = self.advance().clone();
        match token.token_type {
            TokenType::Identifier(name) => Ok(name),
            _ => Err(Error::parse(
                token.line,
                token.column,
                format!("expected identifier for {ctx}"),
            )),
        }
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_expression_bp(0)
    }

    fn parse_expression_bp(&mut self, min_bp: u8) -> Result<Expression> {
        let mut lhs = self.parse_prefix_expression()?;

        // Postfix null predicates: <expr> IS [NOT] NULL
        while self.match_token(&TokenType::Is) {
            let operator = if self.match_token(&TokenType::Not) {
                self.consume(&TokenType::Null, "expected NULL after IS NOT")?;
                UnaryOperator::IsNotNull
            } else {
                self.consume(&TokenType::Null, "expected NULL after IS")?;
                UnaryOperator::IsNull
            };
            lhs = Expression::Unary(Box::new(UnaryExpression {
                operator,
                operand: lhs,
            }));
        }

        loop {
            let Some((operator, lbp, rbp, needs_with)) = self.peek_infix_operator() else {
                break;
            };
            if lbp < min_bp {
                break;
            }

            self.advance();
            if needs_with {
                self.consume(&TokenType::With, "expected WITH after STARTS/ENDS")?;
            }

            let rhs = self.parse_expression_bp(rbp)?;
            lhs = Expression::Binary(Box::new(BinaryExpression {
                left: lhs,
                operator,
                right: rhs,
            }));
        }

        Ok(lhs)
    }

    fn parse_prefix_expression(&mut self) -> Result<Expression> {
        if self.match_token(&TokenType::Not) {
            let operand = self.parse_expression_bp(Self::BP_NOT)?;
            return Ok(Expression::Unary(Box::new(UnaryExpression {
                operator: UnaryOperator::Not,
                operand,
            })));
        }

        // The lexer emits `Dash` for '-' (shared with pattern syntax); in
        // expression position it is unary negation.
        if self.match_token(&TokenType::Dash) {
            let operand = self.parse_expression_bp(Self::BP_PREFIX)?;
            return Ok(Expression::Unary(Box::new(UnaryExpression {
                operator: UnaryOperator::Negate,
                operand,
            })));
        }

        // Unary plus is a no-op.
        if self.match_token(&TokenType::Plus) {
            return self.parse_expression_bp(Self::BP_PREFIX);
        }

        self.parse_primary_expression()
    }

    fn parse_primary_expression(&mut self) -> Result<Expression> {
        let token = self.peek().clone();
        let mut expr = match token.token_type {
            TokenType::LeftParen => {
                self.advance();
                let expr = self.parse_expression_bp(0)?;
                self.consume(&TokenType::RightParen, "expected ')'")?;
                expr
            }
            TokenType::Integer(n) => {
                self.advance();
                Expression::Literal(Literal::Integer(n))
            }
            TokenType::Float(f) => {
                self.advance();
                Expression::Literal(Literal::Float(f))
            }
            TokenType::String(ref s) => {
                let s = s.clone();
                self.advance();
                Expression::Literal(Literal::String(s))
            }
            TokenType::Boolean(b) => {
                self.advance();
                Expression::Literal(Literal::Boolean(b))
            }
            TokenType::Null => {
                self.advance();
                Expression::Literal(Literal::Null)
            }
            TokenType::LeftBracket => {
                self.advance();
                Expression::List(self.parse_list()?)
            }
            TokenType::Identifier(ref name) => {
                let name = name.clone();
                self.advance();
                if self.check(&TokenType::LeftParen) {
                    self.parse_aggregate_call(&name, &token)?
                } else {
                    Expression::Variable(name)
                }
            }
            _ => return Err(self.error_here("expected expression")),
        };

        // Postfix property access: var.attr
        if self.match_token(&TokenType::Dot) {
            let property = self.parse_property_key()?;
            expr = match expr {
                Expression::Variable(variable) => {
                    Expression::Property(PropertyAccess { variable, property })
                }
                _ => {
                    return Err(Error::parse(
                        token.line,
                        token.column,
                        "property access requires a pattern variable",
                    ));
                }
            };
        }

        Ok(expr)
    }

    fn parse_aggregate_call(&mut self, name: &str, token: &Token) -> Result<Expression> {
        let function = match name.to_uppercase().as_str() {
            "COUNT" => AggregateFunction::Count,
            "SUM" => AggregateFunction::Sum,
            "MIN" => AggregateFunction::Min,
            "MAX" => AggregateFunction::Max,
            "AVG" => AggregateFunction::Avg,
            _ => {
                return Err(Error::parse(
                    token.line,
                    token.column,
                    format!("unknown function `{name}`"),
                ));
            }
        };

        self.consume(&TokenType::LeftParen, "expected '('")?;
        let argument = if self.match_token(&TokenType::Asterisk) {
            if function != AggregateFunction::Count {
                return Err(Error::parse(
                    token.line,
                    token.column,
                    "`*` is only valid in COUNT(*)",
                ));
            }
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(&TokenType::RightParen, "expected ')' after aggregate argument")?;

        Ok(Expression::Aggregate(Box::new(AggregateCall {
            function,
            argument,
        })))
    }

    fn parse_list(&mut self) -> Result<Vec<Expression>> {
        let mut items = Vec::new();

        if self.check(&TokenType::RightBracket) {
            self.advance();
            return Ok(items);
        }

        items.push(self.parse_expression()?);
        while self.match_token(&TokenType::Comma) {
            items.push(self.parse_expression()?);
        }

        self.consume(&TokenType::RightBracket, "expected ']' after list")?;
        Ok(items)
    }

    fn peek_infix_operator(&self) -> Option<(BinaryOperator, u8, u8, bool)> {
        // Returns (op, lbp, rbp, needs_with_token).
        use BinaryOperator::*;
        match self.peek().token_type {
            TokenType::Or => Some((Or, Self::BP_OR, Self::BP_OR + 1, false)),
            TokenType::And => Some((And, Self::BP_AND, Self::BP_AND + 1, false)),

            TokenType::Equals => Some((Equals, Self::BP_CMP, Self::BP_CMP + 1, false)),
            TokenType::NotEquals => Some((NotEquals, Self::BP_CMP, Self::BP_CMP + 1, false)),
            TokenType::LessThan => Some((LessThan, Self::BP_CMP, Self::BP_CMP + 1, false)),
            TokenType::LessEqual => Some((LessEqual, Self::BP_CMP, Self::BP_CMP + 1, false)),
            TokenType::GreaterThan => Some((GreaterThan, Self::BP_CMP, Self::BP_CMP + 1, false)),
            TokenType::GreaterEqual => Some((GreaterEqual, Self::BP_CMP, Self::BP_CMP + 1, false)),

            TokenType::In => Some((In, Self::BP_PRED, Self::BP_PRED + 1, false)),
            TokenType::Contains => Some((Contains, Self::BP_PRED, Self::BP_PRED + 1, false)),
            TokenType::Starts => {
                if self.check_next(&TokenType::With) {
                    Some((StartsWith, Self::BP_PRED, Self::BP_PRED + 1, true))
                } else {
                    None
                }
            }
            TokenType::Ends => {
                if self.check_next(&TokenType::With) {
                    Some((EndsWith, Self::BP_PRED, Self::BP_PRED + 1, true))
                } else {
                    None
                }
            }

            TokenType::Plus => Some((Add, Self::BP_ADD, Self::BP_ADD + 1, false)),
            TokenType::Dash => Some((Subtract, Self::BP_ADD, Self::BP_ADD + 1, false)),
            TokenType::Asterisk => Some((Multiply, Self::BP_MUL, Self::BP_MUL + 1, false)),
            TokenType::Divide => Some((Divide, Self::BP_MUL, Self::BP_MUL + 1, false)),
            _ => None,
        }
    }

    fn peek_is_identifier(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Identifier(_))
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        if self.position + 1 >= self.tokens.len() {
            return false;
        }
        let next = &self.tokens[self.position + 1];
        std::mem::discriminant(token_type) == std::mem::discriminant(&next.token_type)
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        std::mem::discriminant(token_type) == std::mem::discriminant(&self.peek().token_type)
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<()> {
        if self.check(token_type) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        let token = self.peek();
        Error::parse(token.line, token.column, message)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        &self.tokens[self.position - 1]
    }
}
