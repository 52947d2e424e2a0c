//! The innermost SUT: a mapper driving one protocol session per query.

use sonar_mapper::{InputMapper, Mapper, OutputMapper};
use sonar_types::{ExecutionContext, InputSymbol, OutputSymbol};

use crate::port::{DynamicPortProvider, SharedPort, SulHandles};
use crate::sul::{Sul, SulError};

/// Opens and closes the protocol session backing one query.
pub trait SessionFactory<S> {
    /// Open a session. `port` is the port reported by the launcher, if any.
    fn open(&mut self, port: Option<u16>) -> Result<S, SulError>;

    /// Release a session opened by `open`.
    fn close(&mut self, _state: S) -> Result<(), SulError> {
        Ok(())
    }
}

impl<S, F> SessionFactory<S> for F
where
    F: FnMut(Option<u16>) -> Result<S, SulError>,
{
    fn open(&mut self, port: Option<u16>) -> Result<S, SulError> {
        self(port)
    }
}

/// Runs each `step` through a mapper against the session opened in `pre`.
pub struct MapperSul<I, O, F>
where
    I: InputMapper,
    O: OutputMapper<Message = I::Message, State = I::State>,
{
    mapper: Mapper<I, O>,
    sessions: F,
    port: SharedPort,
    ctx: Option<ExecutionContext<I::State>>,
}

impl<I, O, F> MapperSul<I, O, F>
where
    I: InputMapper,
    O: OutputMapper<Message = I::Message, State = I::State>,
    F: SessionFactory<I::State>,
{
    pub fn new(mapper: Mapper<I, O>, sessions: F) -> Self {
        Self {
            mapper,
            sessions,
            port: SharedPort::new(),
            ctx: None,
        }
    }

    pub fn mapper(&self) -> &Mapper<I, O> {
        &self.mapper
    }

    /// Context of the query in progress.
    pub fn context(&self) -> Option<&ExecutionContext<I::State>> {
        self.ctx.as_ref()
    }

    fn close_session(&mut self) -> Result<(), SulError> {
        match self.ctx.take() {
            Some(ctx) => self.sessions.close(ctx.into_state()),
            None => Ok(()),
        }
    }
}

impl<I, O, F> Sul for MapperSul<I, O, F>
where
    I: InputMapper,
    O: OutputMapper<Message = I::Message, State = I::State>,
    F: SessionFactory<I::State>,
{
    type Message = I::Message;

    fn pre(&mut self) -> Result<(), SulError> {
        if self.ctx.is_some() {
            tracing::warn!("previous query was not closed, closing it now");
            self.close_session()?;
        }
        let state = self.sessions.open(self.port.dynamic_port())?;
        self.ctx = Some(ExecutionContext::new(state));
        Ok(())
    }

    fn post(&mut self) -> Result<(), SulError> {
        self.close_session()
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<Self::Message>, SulError> {
        let ctx = self.ctx.as_mut().ok_or(SulError::NoSession)?;
        Ok(self.mapper.execute(input, ctx)?)
    }

    fn attach(&mut self, handles: &SulHandles) {
        self.port = handles.port.clone();
        self.mapper.set_liveness(handles.liveness.clone());
    }
}
