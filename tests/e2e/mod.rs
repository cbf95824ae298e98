mod console_pipeline_test;
mod failure_test;
